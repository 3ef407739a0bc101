//! In-process pub/sub hub.
//!
//! Topic-keyed broadcast channels used for two things:
//! - waking a waiting matchmaking request as soon as its entry is claimed
//!   (`match:{entry_key}`)
//! - pushing new chat messages to SSE subscribers (`chat:{conversation_id}`)
//!
//! Delivery is best effort. Pollers still re-read the pool, so a missed
//! publish only costs latency.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Thread-safe, cloneable hub keyed by string topics.
/// Payloads are `serde_json::Value`; domains serialize their own types.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Publish to a topic. Returns how many subscribers received it (0 if none).
    pub async fn publish(&self, topic: &str, value: serde_json::Value) -> usize {
        let channels = self.channels.read().await;
        channels
            .get(topic)
            .and_then(|tx| tx.send(value).ok())
            .unwrap_or(0)
    }

    /// Subscribe to a topic, creating its channel on first use.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Drop one topic's channel if nobody listens anymore.
    pub async fn release(&self, topic: &str) {
        let mut channels = self.channels.write().await;
        if channels
            .get(topic)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(topic);
        }
    }

    /// Remove every channel with zero subscribers (housekeeping).
    pub async fn cleanup(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}
