use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Waits for a change, then for `window` to pass with no further change, then
/// calls `flush` once. Repeats until the change channel closes or `flush`
/// returns `false`.
///
/// Changes that land while the timer runs restart it, so a burst of N changes
/// costs a single flush. Changes pending when the channel closes are dropped.
pub async fn debounce_changes<F, Fut>(mut changes: watch::Receiver<u64>, window: Duration, mut flush: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    loop {
        if changes.changed().await.is_err() {
            break;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(window) => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        debug!("Change channel closed inside the debounce window");
                        return;
                    }
                }
            }
        }

        if !flush().await {
            break;
        }
    }
}
