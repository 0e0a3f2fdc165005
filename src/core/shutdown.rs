//! Cooperative shutdown signal
//!
//! The CLI flips a `watch` channel to `true` on SIGINT/SIGTERM. Pipeline stages
//! hold a [`Shutdown`] and race their sleeps and in-flight calls against it.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Receiving side of the shutdown channel
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Wrap the receiver of a `watch::channel(false)`
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// True once shutdown was requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested
    ///
    /// Pends forever if the sender is dropped without signalling.
    pub async fn requested(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration`; returns `true` if shutdown cut the sleep short
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.requested() => true,
            _ = tokio::time::sleep(duration) => false,
        }
    }

    /// Run `fut` to completion unless shutdown is requested first
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.requested() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_signal() {
        let (_tx, rx) = watch::channel(false);
        let shutdown = Shutdown::new(rx);
        assert!(!shutdown.sleep(Duration::from_secs(30)).await);
        assert!(!shutdown.is_requested());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted() {
        let (tx, rx) = watch::channel(false);
        let shutdown = Shutdown::new(rx);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = tx.send(true);
        });

        let started = tokio::time::Instant::now();
        assert!(shutdown.sleep(Duration::from_secs(60)).await);
        assert!(started.elapsed() < Duration::from_secs(60));
        assert!(shutdown.is_requested());
    }

    #[tokio::test]
    async fn test_run_skips_future_after_signal() {
        let (tx, rx) = watch::channel(false);
        let shutdown = Shutdown::new(rx);
        tx.send(true).unwrap();

        let out = shutdown.run(async { 42 }).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_run_returns_output() {
        let shutdown = Shutdown::never();
        assert_eq!(shutdown.run(async { 7 }).await, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_does_not_fire() {
        let shutdown = Shutdown::never();
        assert!(!shutdown.sleep(Duration::from_secs(5)).await);
    }
}
