use anyhow::{Context, Result};
use microreactor_siting::{config, scenario::Scenario, telemetry, SitingError};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load().context("loading configuration")?;
    let scenario = Scenario::new(cfg).context("invalid configuration")?;

    info!(
        grid_size = scenario.config().grid.size,
        disaster = %scenario.config().disaster.kind,
        facilities = scenario.config().placement.facility_count,
        solver = %scenario.config().placement.solver,
        "starting siting run"
    );

    match scenario.run() {
        Ok(report) => {
            info!(run_id = %report.run_id, seed = ?report.seed, "{}", report.metrics());
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(SitingError::SolverTimeout {
            elapsed,
            best: Some(best),
        }) => {
            warn!(
                ?elapsed,
                objective = best.objective,
                "solver timed out, reporting best placement found"
            );
            println!("{}", serde_json::to_string_pretty(&best)?);
            Ok(())
        }
        Err(e) => Err(e).context("siting run failed"),
    }
}
