//! Process-wide shutdown signal
//!
//! Level-triggered: once fired it stays fired, so every wait point that looks
//! at it afterwards returns immediately.

use std::time::Duration;
use tokio::sync::watch;

/// Fires the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observes the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested. Cancel-safe.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Trigger dropped without firing: nobody can ask us to stop anymore
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration` unless shutdown comes first. Returns true if interrupted.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sleep_completes_without_trigger() {
        let (_trigger, mut shutdown) = channel();
        assert!(!shutdown.sleep(Duration::from_millis(10)).await);
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_trigger() {
        let (trigger, mut shutdown) = channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_secs(10)).await);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_trigger_is_sticky_for_clones() {
        let (trigger, mut shutdown) = channel();
        trigger.trigger();

        let mut late = shutdown.clone();
        assert!(late.is_triggered());
        assert!(late.sleep(Duration::from_secs(10)).await);
        shutdown.wait().await;
    }
}
