use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::ArgMatches;
use tm_convert_api::{ModelFormat, ModelSources};

use crate::{NO_OPTIMIZE_ENV, USAGE};

/// Validated conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub format: ModelFormat,
    pub sources: ModelSources,
    pub output: PathBuf,
    pub optimize: bool,
}

impl Parameters {
    /// Checks the command line against the chosen format. Everything is
    /// verified here, before the engine is touched; the first problem found
    /// is reported.
    pub fn from_clap(matches: &ArgMatches) -> Result<Parameters> {
        let format: ModelFormat = match value(matches, "format") {
            Some(name) => name.parse()?,
            None => bail!("{USAGE}"),
        };

        let proto = value(matches, "proto");
        let sources = if format.needs_proto() {
            let proto = existing_file(
                proto,
                "Please specify the -p option to indicate the input proto file.",
                "Proto file",
            )?;
            let model = model_file(matches)?;
            ModelSources::Pair { proto, model }
        } else {
            if let Some(proto) = proto {
                warn!("{format} models are a single file, ignoring proto file {proto}");
            }
            ModelSources::Single { model: model_file(matches)? }
        };

        let Some(output) = value(matches, "output") else {
            bail!("Please specify the -o option to indicate the output tengine model file.")
        };
        if let Some(dir) = output_dir(output) {
            if !Path::new(dir).is_dir() {
                bail!("The dir of output file does not exist: {dir}");
            }
        }
        let output = PathBuf::from(output);

        let optimize = optimize_requested(std::env::var_os(NO_OPTIMIZE_ENV));
        debug!("format: {format}, sources: {sources:?}, output: {output:?}, optimize: {optimize}");
        Ok(Parameters { format, sources, output, optimize })
    }
}

/// Optimization runs unless the opt-out variable is set, whatever its value.
pub fn optimize_requested(no_optimize: Option<OsString>) -> bool {
    no_optimize.is_none()
}

/// Directory part of the output argument: the text before the last `/`, so
/// `a/b/` names directory `a/b`. A bare file name or `/x.tm` has none to check.
fn output_dir(output: &str) -> Option<&str> {
    output.rfind('/').map(|ix| &output[..ix]).filter(|dir| !dir.is_empty())
}

/// Empty values count as missing.
fn value<'m>(matches: &'m ArgMatches, name: &str) -> Option<&'m str> {
    matches.value_of(name).filter(|v| !v.is_empty())
}

fn model_file(matches: &ArgMatches) -> Result<PathBuf> {
    existing_file(
        value(matches, "model"),
        "Please specify the -m option to indicate the input model file.",
        "Model file",
    )
}

fn existing_file(path: Option<&str>, missing_option: &str, what: &str) -> Result<PathBuf> {
    let Some(path) = path else { bail!("{missing_option}") };
    let path = PathBuf::from(path);
    if !path.exists() {
        bail!("{what} does not exist: {}", path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(args: &[&str]) -> Result<Parameters> {
        let matches = crate::app()
            .try_get_matches_from(std::iter::once("convert_model_to_tm").chain(args.iter().copied()))?;
        Parameters::from_clap(&matches)
    }

    fn touch(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, b"model").unwrap();
        path.to_str().unwrap().to_string()
    }

    fn out(dir: &Path) -> String {
        dir.join("out.tm").to_str().unwrap().to_string()
    }

    #[test]
    fn missing_format_prints_usage() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let e = params(&["-m", &model, "-o", &out(dir.path())]).unwrap_err();
        assert_eq!(e.to_string(), USAGE);
        let e = params(&["-f", "", "-m", &model, "-o", &out(dir.path())]).unwrap_err();
        assert_eq!(e.to_string(), USAGE);
    }

    #[test]
    fn unsupported_format_wins_over_everything() {
        let e = params(&["-f", "pytorch"]).unwrap_err();
        assert_eq!(e.to_string(), ModelFormat::allow_list());
        let e = params(&["-f", "Caffe", "-p", "/nope", "-m", "/nope"]).unwrap_err();
        assert_eq!(e.to_string(), ModelFormat::allow_list());
    }

    #[test]
    fn two_file_format_needs_proto() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.caffemodel");
        for format in ["caffe", "mxnet", "darknet", "ncnn"] {
            let e = params(&["-f", format, "-m", &model, "-o", &out(dir.path())]).unwrap_err();
            assert_eq!(
                e.to_string(),
                "Please specify the -p option to indicate the input proto file.",
                "{format}"
            );
        }
    }

    #[test]
    fn two_file_format_proto_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.caffemodel");
        let proto = dir.path().join("net.prototxt");
        let proto = proto.to_str().unwrap();
        let e = params(&["-f", "caffe", "-p", proto, "-m", &model, "-o", &out(dir.path())])
            .unwrap_err();
        assert_eq!(e.to_string(), format!("Proto file does not exist: {proto}"));
    }

    #[test]
    fn two_file_format_proto_checked_before_model() {
        let e = params(&["-f", "ncnn", "-p", "/no/such/net.param", "-m", "/no/such/net.bin"])
            .unwrap_err();
        assert_eq!(e.to_string(), "Proto file does not exist: /no/such/net.param");
    }

    #[test]
    fn two_file_format_ok() {
        let dir = tempfile::tempdir().unwrap();
        let proto = touch(dir.path(), "net.prototxt");
        let model = touch(dir.path(), "net.caffemodel");
        let p = params(&["-f", "caffe", "-p", &proto, "-m", &model, "-o", &out(dir.path())])
            .unwrap();
        assert_eq!(p.format, ModelFormat::Caffe);
        assert_eq!(p.sources, ModelSources::Pair { proto: proto.into(), model: model.into() });
        assert_eq!(p.output, dir.path().join("out.tm"));
    }

    #[test]
    fn model_option_required() {
        let dir = tempfile::tempdir().unwrap();
        let e = params(&["-f", "onnx", "-o", &out(dir.path())]).unwrap_err();
        assert_eq!(e.to_string(), "Please specify the -m option to indicate the input model file.");
        let proto = touch(dir.path(), "net.cfg");
        let e = params(&["-f", "darknet", "-p", &proto, "-o", &out(dir.path())]).unwrap_err();
        assert_eq!(e.to_string(), "Please specify the -m option to indicate the input model file.");
    }

    #[test]
    fn model_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let e = params(&["-f", "tflite", "-m", "/no/such/net.tflite", "-o", &out(dir.path())])
            .unwrap_err();
        assert_eq!(e.to_string(), "Model file does not exist: /no/such/net.tflite");
    }

    #[test]
    fn one_file_format_ignores_proto() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.pb");
        let p = params(&[
            "-f",
            "tensorflow",
            "-p",
            "/no/such/proto",
            "-m",
            &model,
            "-o",
            &out(dir.path()),
        ])
        .unwrap();
        assert_eq!(p.format, ModelFormat::Tensorflow);
        assert_eq!(p.sources, ModelSources::Single { model: model.into() });
    }

    #[test]
    fn output_option_required() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let e = params(&["-f", "onnx", "-m", &model]).unwrap_err();
        assert_eq!(
            e.to_string(),
            "Please specify the -o option to indicate the output tengine model file."
        );
        let e = params(&["-f", "onnx", "-m", &model, "-o", ""]).unwrap_err();
        assert_eq!(
            e.to_string(),
            "Please specify the -o option to indicate the output tengine model file."
        );
    }

    #[test]
    fn output_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let missing = dir.path().join("missing");
        let output = missing.join("out.tm");
        let e = params(&["-f", "onnx", "-m", &model, "-o", output.to_str().unwrap()]).unwrap_err();
        assert_eq!(
            e.to_string(),
            format!("The dir of output file does not exist: {}", missing.display())
        );
    }

    #[test]
    fn output_trailing_slash_checks_whole_dir() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let missing = format!("{}/missing", dir.path().to_str().unwrap());
        let output = format!("{missing}/");
        let e = params(&["-f", "onnx", "-m", &model, "-o", &output]).unwrap_err();
        assert_eq!(e.to_string(), format!("The dir of output file does not exist: {missing}"));
    }

    #[test]
    fn output_dir_split() {
        assert_eq!(output_dir("net.tm"), None);
        assert_eq!(output_dir("/net.tm"), None);
        assert_eq!(output_dir("models/net.tm"), Some("models"));
        assert_eq!(output_dir("a/b/"), Some("a/b"));
    }

    #[test]
    fn no_optimize_variable() {
        assert!(optimize_requested(None));
        assert!(!optimize_requested(Some(OsString::new())));
        assert!(!optimize_requested(Some(OsString::from("1"))));
        assert!(!optimize_requested(Some(OsString::from("0"))));
    }

    #[test]
    fn bare_output_name_is_relative_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let p = params(&["-f", "caffe_single", "-m", &model, "-o", "net.tm"]).unwrap();
        assert_eq!(p.output, PathBuf::from("net.tm"));
    }

    #[test]
    fn long_options() {
        let dir = tempfile::tempdir().unwrap();
        let model = touch(dir.path(), "net.onnx");
        let output = out(dir.path());
        let p = params(&["--format", "onnx", "--model", &model, "--output", &output]).unwrap();
        assert_eq!(p.format, ModelFormat::Onnx);
        assert_eq!(p.output, PathBuf::from(output));
    }
}
