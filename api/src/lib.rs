use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;

/// Format tag handed to the native serializer for `.tm` output.
pub const SAVE_FORMAT: &str = "tengine";

/// Source model formats the native loader can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Caffe,
    CaffeSingle,
    Onnx,
    Mxnet,
    Tensorflow,
    Tflite,
    Darknet,
    Ncnn,
    #[cfg(feature = "megengine")]
    Megengine,
}

impl ModelFormat {
    /// Formats compiled into this build, in allow-list order.
    pub fn all() -> &'static [ModelFormat] {
        use ModelFormat::*;
        &[
            Caffe,
            CaffeSingle,
            Onnx,
            Mxnet,
            Tensorflow,
            Tflite,
            Darknet,
            Ncnn,
            #[cfg(feature = "megengine")]
            Megengine,
        ]
    }

    /// Name understood by the native loader.
    pub fn name(&self) -> &'static str {
        match self {
            ModelFormat::Caffe => "caffe",
            ModelFormat::CaffeSingle => "caffe_single",
            ModelFormat::Onnx => "onnx",
            ModelFormat::Mxnet => "mxnet",
            ModelFormat::Tensorflow => "tensorflow",
            ModelFormat::Tflite => "tflite",
            ModelFormat::Darknet => "darknet",
            ModelFormat::Ncnn => "ncnn",
            #[cfg(feature = "megengine")]
            ModelFormat::Megengine => "megengine",
        }
    }

    /// Number of files the loader expects: a structure (proto) file and a
    /// weights file, or a single self-contained model file.
    pub fn input_count(&self) -> usize {
        match self {
            ModelFormat::Caffe | ModelFormat::Mxnet | ModelFormat::Darknet | ModelFormat::Ncnn => 2,
            _ => 1,
        }
    }

    pub fn needs_proto(&self) -> bool {
        self.input_count() == 2
    }

    /// One-line description of accepted `-f` values.
    pub fn allow_list() -> String {
        let names: Vec<&str> = Self::all().iter().map(|f| f.name()).collect();
        format!("Allowed input file format: {}", names.join(", "))
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<ModelFormat> {
        Self::all()
            .iter()
            .find(|f| f.name() == s)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("{}", Self::allow_list()))
    }
}

/// Input files for the native loader, already checked for existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSources {
    Single { model: PathBuf },
    Pair { proto: PathBuf, model: PathBuf },
}

impl ModelSources {
    /// Paths in loader argument order.
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            ModelSources::Single { model } => vec![model],
            ModelSources::Pair { proto, model } => vec![proto, model],
        }
    }

    pub fn model(&self) -> &Path {
        match self {
            ModelSources::Single { model } | ModelSources::Pair { model, .. } => model,
        }
    }
}

/// A process-wide handle on the inference engine.
pub trait EngineInterface {
    type Graph: GraphInterface;

    /// Version string reported by the engine.
    fn version(&self) -> Result<String>;

    /// Builds a graph from source model files. The source layout must match
    /// the format's `input_count`.
    fn load(&self, format: ModelFormat, sources: &ModelSources) -> Result<Self::Graph>;
}

/// An engine-owned network graph.
pub trait GraphInterface {
    /// Restrict the next `prerun` to graph rewriting, without allocating
    /// execution buffers.
    fn set_optimize_only(&mut self, optimize_only: bool) -> Result<()>;

    fn prerun(&mut self) -> Result<()>;

    fn save(&self, format: &str, path: impl AsRef<Path>) -> Result<()>;
}
