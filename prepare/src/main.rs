use anyhow::{bail, Context};
use ingestion::processor::DatasetPipeline;
use kgprep_core::config::AppConfig;
use kgprep_core::error::KgprepError;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    kgprep_core::init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    let pipeline = DatasetPipeline::new(&config.pipeline);
    info!(
        output_dir = %config.pipeline.output_dir.display(),
        datasets = config.datasets.len(),
        "preparing triples"
    );

    let mut failures = 0usize;
    for dataset in &config.datasets {
        match pipeline.run(dataset).await {
            Ok(run) => {
                for save in run.failed_saves() {
                    failures += 1;
                    if let Err(err) = &save.result {
                        error!(
                            dataset = %dataset.name,
                            split = %save.split,
                            code = %err.error_code(),
                            "split not cached: {}",
                            err
                        );
                    }
                }
            }
            Err(err) => {
                failures += 1;
                error!(
                    dataset = %dataset.name,
                    code = %err.error_code(),
                    "dataset skipped: {}",
                    err
                );
            }
        }
    }

    if failures > 0 {
        bail!("{} dataset or split unit(s) failed", failures);
    }
    info!("all datasets prepared");
    Ok(())
}
