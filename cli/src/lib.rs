#[macro_use]
extern crate log;

pub mod convert;
pub mod params;

pub use convert::convert;
pub use params::Parameters;

/// Short usage line, printed when no input format is given.
pub const USAGE: &str =
    "[Usage]: [-h] [-f file_format] [-p proto_file] [-m model_file] [-o output_tmfile]";

/// When present in the environment (with any value), the optimize-only
/// prerun is skipped and the graph is saved as loaded.
pub const NO_OPTIMIZE_ENV: &str = "TM_NO_OPTIMIZE";

/// Logger configuration, same syntax as RUST_LOG.
pub const LOG_ENV: &str = "TM_CONVERT_LOG";

/// Command line definition. Every value is optional here: which files are
/// required depends on the chosen format and is checked by
/// `Parameters::from_clap`.
pub fn app() -> clap::Command<'static> {
    use clap::*;
    Command::new("convert_model_to_tm")
        .version(crate_version!())
        .about("Convert a caffe, onnx, tensorflow, tflite, mxnet, darknet or ncnn model to a tengine model file")
        .override_usage(
            "convert_model_to_tm [-h] [-f file_format] [-p proto_file] [-m model_file] [-o output_tmfile]",
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .takes_value(true)
                .value_name("file_format")
                .help("Source model format"),
        )
        .arg(
            Arg::new("proto")
                .short('p')
                .long("proto")
                .takes_value(true)
                .value_name("proto_file")
                .help("Network structure file, for caffe, mxnet, darknet and ncnn"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .takes_value(true)
                .value_name("model_file")
                .help("Model (weights) file"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("output_tmfile")
                .help("Tengine model file to write"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .multiple_occurrences(true)
                .help("Sets the level of verbosity."),
        )
}
