//! Process-wide stop flag.
//!
//! The HTTP server waits on [`ShutdownSignal::wait`] to stop accepting
//! connections. The coordinator also carries how long in-flight booking
//! requests get to finish before the pool is closed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

/// Cloneable one-shot flag. Every clone observes the same trigger.
#[derive(Clone)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self { flag: Arc::new(flag) }
    }

    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    pub fn trigger(&self) {
        let first = self.flag.send_if_modified(|stopped| !std::mem::replace(stopped, true));
        if first {
            info!("shutdown requested");
        }
    }

    pub async fn wait(&self) {
        let mut rx = self.flag.subscribe();
        // Only fails if the sender is gone, and `self` holds it.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn os_stop_request() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate())?;
        let mut int = signal(SignalKind::interrupt())?;
        Ok(tokio::select! {
            _ = term.recv() => "SIGTERM",
            _ = int.recv() => "SIGINT",
        })
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("Ctrl+C")
    }
}

pub struct ShutdownCoordinator {
    signal: ShutdownSignal,
    drain: Duration,
}

impl ShutdownCoordinator {
    pub fn new(drain_secs: u64) -> Self {
        Self {
            signal: ShutdownSignal::new(),
            drain: Duration::from_secs(drain_secs),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    /// Grace period for in-flight requests.
    pub fn timeout(&self) -> Duration {
        self.drain
    }

    /// Triggers the signal on SIGTERM or SIGINT.
    pub fn start_signal_listener(&self) {
        let signal = self.signal();
        tokio::spawn(async move {
            match os_stop_request().await {
                Ok(name) => {
                    info!(signal = name, "stop signal received");
                    signal.trigger();
                }
                Err(err) => warn!(error = %err, "could not install signal handlers"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_wake_up_on_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        tokio::task::yield_now().await;
        assert!(!signal.is_triggered());

        signal.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn late_waiters_do_not_block() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(signal.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }

    #[test]
    fn coordinator_keeps_the_drain_period() {
        let coordinator = ShutdownCoordinator::new(7);
        assert_eq!(coordinator.timeout(), Duration::from_secs(7));
        coordinator.signal().trigger();
        assert!(coordinator.signal().is_triggered());
    }
}
