use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize structured logging for the process. Safe to call more than
/// once; later calls are ignored.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
