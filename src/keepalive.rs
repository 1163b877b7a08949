use crate::constants::KEEPALIVE_PAYLOAD;
use crate::transport::KeepaliveLink;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Reported by the keepalive task to the session that spawned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    KeepaliveFailed { epoch: u64 },
}

/// Periodic keepalive pulses for one connected session.
///
/// The task owns the link and nothing else. It stops on [`Keepalive::stop`],
/// on drop, or on the first failed pulse, which it reports as a
/// [`SessionEvent`] tagged with the session epoch.
pub(crate) struct Keepalive {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Keepalive {
    pub(crate) fn spawn(
        mut link: Box<dyn KeepaliveLink>,
        interval: Duration,
        epoch: u64,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = link.pulse(KEEPALIVE_PAYLOAD).await {
                    log::warn!("Heartbeat failed: {}", e);
                    link.close().await;
                    let _ = events.send(SessionEvent::KeepaliveFailed { epoch });
                    return;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = &mut stopped => {
                        link.close().await;
                        log::debug!("Keepalive stopped");
                        return;
                    }
                }
            }
        });

        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Stops the task and waits until the link is closed.
    pub(crate) async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
