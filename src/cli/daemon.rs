use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::core::bootstrap::App;
use crate::core::config::Config;
use crate::core::terminal::{print_info, print_success};

/// Foreground scheduler loop: ticks once a minute and fires any due
/// schedules. Ctrl-C shuts it down.
pub async fn run() -> Result<()> {
    let app = App::init(Config::from_env()?)?;
    let scheduler = app.scheduler.clone();

    let mut cron = JobScheduler::new().await?;
    let tick_scheduler = scheduler.clone();
    let job = Job::new_async("0 * * * * *", move |_uuid, mut _l| {
        let scheduler = tick_scheduler.clone();
        Box::pin(async move {
            match scheduler.check_and_run_due().await {
                Ok(fired) if fired > 0 => info!("Tick fired {} schedule(s)", fired),
                Ok(_) => {}
                Err(e) => error!("Scheduler tick failed: {}", e),
            }
        })
    })?;
    cron.add(job).await?;
    cron.start().await?;

    print_success("Scheduler daemon running. Press Ctrl-C to stop.");
    // Catch up immediately in case a slot passed while the daemon was down.
    match scheduler.check_and_run_due().await {
        Ok(fired) if fired > 0 => info!("Startup catch-up fired {} schedule(s)", fired),
        Ok(_) => {}
        Err(e) => error!("Startup catch-up failed: {}", e),
    }

    tokio::signal::ctrl_c().await?;
    print_info("Shutting down.");
    cron.shutdown().await?;
    Ok(())
}
