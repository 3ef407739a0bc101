//! Test fixtures for creating test data.

use std::future::Future;
use std::time::Duration;

use agree_core::domains::matching::models::ProfileSnapshot;

pub fn profile(username: &str, party: &str, interests: &[&str]) -> ProfileSnapshot {
    ProfileSnapshot {
        username: username.to_string(),
        party: party.to_string(),
        interests: interests.iter().map(|s| s.to_string()).collect(),
        avatar: None,
    }
}

/// Poll `check` until it returns true, panicking after `timeout`.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while !check().await {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not reached within {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
