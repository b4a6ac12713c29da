//! Restart-on-change for the binary.
//!
//! Compiled code cannot be swapped in place, so the first source change
//! triggers graceful shutdown and the process supervisor starts a fresh
//! build.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;
use crate::reload::ReloadEvent;

/// Trigger `shutdown` on the first event from `events`.
///
/// The task also ends, without triggering, when `shutdown` fires for another
/// reason or every sender is dropped.
pub fn spawn_restart_on_change(
    mut events: mpsc::UnboundedReceiver<ReloadEvent>,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    let mut stopped = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            event = events.recv() => {
                if let Some(event) = event {
                    tracing::info!(paths = ?event.paths, "Source changed; exiting for restart");
                    shutdown.trigger();
                }
            }
            _ = stopped.recv() => {}
        }
    })
}
