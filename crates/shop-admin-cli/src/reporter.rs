use shop_admin::{AdminEvent, SyncStatus};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::warn;

/// Prints notices and sync status from the admin event stream to stderr.
pub struct Reporter {
    handle: JoinHandle<()>,
}

impl Reporter {
    pub fn spawn(mut rx: broadcast::Receiver<AdminEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut shown = SyncStatus::Idle;
            loop {
                match rx.recv().await {
                    Ok(AdminEvent::Notice(notice)) => eprintln!("{notice}"),
                    Ok(AdminEvent::Status(status)) => {
                        if status != shown
                            && let Some(banner) = status.banner()
                        {
                            eprintln!("{banner}");
                        }
                        shown = status;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Self { handle }
    }

    /// Wait for the stream to close. Every sender must be dropped first.
    pub async fn finish(self) {
        let _ = self.handle.await;
    }
}
