//! Cooperative shutdown over a `watch` channel.
//!
//! `true` means stop. A dropped sender also counts as stop.

use std::time::Duration;
use tokio::sync::watch;

/// Resolve once shutdown has been requested
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    // Err means the sender is gone
    let _ = rx.wait_for(|stopped| *stopped).await;
}

/// Sleep for `duration` unless shutdown comes first. Returns `true` on shutdown.
pub async fn sleep_or_shutdown(duration: Duration, rx: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(rx) => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_shutdown() {
        let (_tx, mut rx) = watch::channel(false);
        assert!(!sleep_or_shutdown(Duration::from_secs(60), &mut rx).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_sleep() {
        let (tx, mut rx) = watch::channel(false);
        let sleeper = tokio::spawn(async move {
            sleep_or_shutdown(Duration::from_secs(3600), &mut rx).await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send_replace(true);
        assert!(sleeper.await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_sender_counts_as_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert!(sleep_or_shutdown(Duration::from_secs(3600), &mut rx).await);
    }
}
