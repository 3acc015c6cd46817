mod batch;
mod continuous;

pub use batch::*;
pub use continuous::*;

use tokio::sync::watch;

/// Sleep for `duration` unless shutdown is signalled first; returns true on
/// shutdown. A closed channel counts as shutdown.
pub(crate) async fn sleep_or_shutdown(
    duration: std::time::Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        res = shutdown.changed() => res.is_err() || *shutdown.borrow(),
    }
}
