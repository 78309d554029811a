use anyhow::Context;
use bundle_harvest::{
    configuration::get_configuration,
    dal::{transfer_all, HttpBundleTransfer, JsonFileSink, ResultSink},
    services::{CatalogHarvester, Droid, RenderSurface},
};
use env_logger::Env;
use itertools::Itertools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let plan = configuration.harvest_plan();

    let droid = Droid::new(&configuration.webdriver)
        .await
        .context("Failed to start webdriver session")?;

    let harvest_result = CatalogHarvester::new(&droid, plan.clone())
        .harvest(plan.entry_count)
        .await;

    // The session is closed whether or not the harvest succeeded.
    if let Err(e) = droid.close().await {
        log::error!("Failed to close webdriver session: {:?}", e);
    }

    let result = harvest_result.context("Harvest failed, no result written")?;

    let sink = JsonFileSink::new(&configuration.output.directory);
    let path = sink
        .write(&result, &configuration.output.file_name)
        .await
        .context("Failed to persist harvest result")?;

    // Bundles are transferred even for a partial result. The run still fails below.
    let transfer = &configuration.output.transfer;
    if transfer.enabled {
        let report = transfer_all(
            &HttpBundleTransfer::new(&transfer.directory, &transfer.prefix),
            &result,
        )
        .await;
        log::info!(
            "Transferred {} of {} bundles",
            report.stored.len(),
            result.len()
        );
        if !report.is_complete() {
            anyhow::bail!(
                "{} bundles failed to transfer: {}",
                report.failed.len(),
                report.failed.iter().map(|(locator, _)| locator).join(", ")
            );
        }
    }

    if !result.is_complete() {
        for failure in result.skipped() {
            log::error!("Skipped {}", failure);
        }
        anyhow::bail!(
            "{} is partial: rows {} were skipped",
            path.display(),
            result.skipped().iter().map(|f| f.index).join(", ")
        );
    }

    Ok(())
}
