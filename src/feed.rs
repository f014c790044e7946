//! Forward broadcast status updates into the tray.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::backend::TrayBackend;
use crate::controller::TrayController;
use crate::status::Status;

/// Start the tray update loop.
///
/// Every status received is handed to [`TrayController::update`]. A lagging
/// receiver skips the missed statuses, since only the newest one matters. The
/// loop ends when all senders are dropped.
pub fn spawn_update_loop<B: TrayBackend>(
    controller: TrayController<B>,
    mut receiver: broadcast::Receiver<Status>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        log::info!("Tray update loop started");

        loop {
            match receiver.recv().await {
                Ok(status) => {
                    controller.update(&status);
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Tray update loop lagged, skipped {} statuses", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        log::info!("Tray update loop ended");
    })
}
