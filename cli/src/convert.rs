use anyhow::{Context, Result};
use tm_convert_api::{EngineInterface, GraphInterface, SAVE_FORMAT};

use crate::{NO_OPTIMIZE_ENV, Parameters};

/// Loads the source model, optionally runs the optimize-only prerun, and
/// writes the tengine model file. The graph is released before returning.
pub fn convert<E: EngineInterface>(engine: &E, params: &Parameters) -> Result<()> {
    info!("Loading {} model from {:?}", params.format, params.sources.paths());
    let mut graph = engine.load(params.format, &params.sources).context("Create graph failed")?;

    if params.optimize {
        info!("Optimizing graph");
        graph.set_optimize_only(true).context("set optimize only failed")?;
        graph.prerun().context("prerun failed")?;
    } else {
        info!("{NO_OPTIMIZE_ENV} is set, skipping graph optimization");
    }

    info!("Saving to {:?}", params.output);
    graph.save(SAVE_FORMAT, &params.output).context("Create tengine model file failed.")?;
    Ok(())
}
