//! Stop notice shared by the HTTP server and the signal listener.

use tokio::sync::broadcast;

/// Fans a single stop notice out to every subscribed task.
///
/// A receiver only sees notices sent after it subscribed, so startup
/// subscribes the server before the signal listener is spawned.
#[derive(Clone)]
pub struct Shutdown {
    notice: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notice, _) = broadcast::channel(1);
        Self { notice }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notice.subscribe()
    }

    /// Send the stop notice. Repeated calls and calls with no listeners are no-ops.
    pub fn trigger(&self) {
        if self.notice.send(()).is_err() {
            tracing::debug!("Stop notice sent with no listeners");
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.notice.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
