//! Generate static files

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::cache::{self, CacheDb, ChangeSet};
use crate::generator::Generator;
use crate::SpaceTraveling;

/// Generate the static site, incrementally unless `force` is set
pub async fn run(app: &SpaceTraveling, force: bool) -> Result<ChangeSet> {
    let start = Instant::now();

    let client = app.client()?;
    let generator = Generator::new(app, client)?;
    let previous = CacheDb::load(&app.base_dir);

    let generation = generator.generate(&previous, force).await?;
    generation.cache.save(&app.base_dir)?;

    tracing::info!(
        "Generated {} posts in {:.2}s",
        generation.post_count,
        start.elapsed().as_secs_f64()
    );
    Ok(generation.changes)
}

/// Regenerate on a fixed interval until Ctrl+C.
///
/// The CMS pushes no change events to a local build, so content is polled;
/// the config file is re-read before every run.
pub async fn watch(app: &SpaceTraveling, interval: Duration) -> Result<()> {
    tracing::info!(
        "Polling the CMS every {}s (incremental mode). Press Ctrl+C to stop.",
        interval.as_secs()
    );

    let mut app = app.clone();
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        match app.reload() {
            Ok(reloaded) => app = reloaded,
            Err(e) => tracing::warn!("Keeping previous config: {:#}", e),
        }
        match run(&app, false).await {
            Ok(changes) if changes.has_changes() => {
                tracing::info!("Regenerated: {}", changes.summary())
            }
            Ok(_) => tracing::debug!("No changes"),
            Err(e) => tracing::error!("Generation failed: {:#}", e),
        }
    }

    Ok(())
}

/// Clear the cache
pub fn clear_cache(app: &SpaceTraveling) -> Result<()> {
    cache::clear(&app.base_dir)
}
