//! Background logging of vote change events.

use likes_shared::types::VoteChanged;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Logs every vote change received on `events`.
///
/// The task drains the queue and ends once every sender is dropped, returning
/// the number of events it logged.
pub fn spawn_event_logger(mut events: broadcast::Receiver<VoteChanged>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match events.recv().await {
                Ok(event) => {
                    info!(resource_id = event.resource_id, action = ?event.action, "Vote changed");
                    logged += 1;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Vote event logger lagged behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}
