#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use log::LevelFilter;
use tm_convert::{LOG_ENV, Parameters};

/// Entrypoint for the command-line interface.
fn main() {
    let matches = tm_convert::app().get_matches();

    let level = match matches.occurrences_of("verbosity") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).parse_env(LOG_ENV).init();

    match handle(&matches) {
        Ok(output) => println!("Create tengine model file done: {}", output.display()),
        Err(e) => {
            println!("{e}");
            debug!("{e:?}");
            process::exit(-1)
        }
    }
}

/// Handles the command-line input.
fn handle(matches: &clap::ArgMatches) -> Result<PathBuf> {
    let params = Parameters::from_clap(matches)?;
    run(&params)?;
    Ok(params.output)
}

#[cfg(feature = "tengine")]
fn run(params: &Parameters) -> Result<()> {
    use tm_convert_api::EngineInterface;

    let engine = tm_convert_proxy::tengine()?;
    match engine.version() {
        Ok(version) => info!("tengine {version}"),
        Err(e) => warn!("{e}"),
    }
    tm_convert::convert(&engine, params)
}

#[cfg(not(feature = "tengine"))]
fn run(_params: &Parameters) -> Result<()> {
    anyhow::bail!("tengine support not compiled in, rebuild with the tengine feature")
}
