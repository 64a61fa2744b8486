//! Pacing between consecutive LLM requests.

use async_trait::async_trait;
use std::time::Duration;

/// Scheduling policy applied between two chunk requests.
#[async_trait]
pub trait RequestPacer: Send + Sync {
    /// Wait before the next request is sent.
    async fn pause(&self);
}

/// Fixed minimum delay between requests.
#[derive(Debug, Clone, Copy)]
pub struct FixedInterval(pub Duration);

impl FixedInterval {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }
}

#[async_trait]
impl RequestPacer for FixedInterval {
    async fn pause(&self) {
        if self.0.is_zero() {
            return;
        }
        tracing::debug!("Waiting {:?} before the next request", self.0);
        tokio::time::sleep(self.0).await;
    }
}

/// No delay at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl RequestPacer for NoPacing {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fixed_interval_sleeps() {
        let start = Instant::now();
        FixedInterval(Duration::from_millis(50)).pause().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_no_pacing_returns_immediately() {
        let start = Instant::now();
        NoPacing.pause().await;
        FixedInterval(Duration::ZERO).pause().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
