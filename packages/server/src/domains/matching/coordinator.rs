//! Matchmaking coordinator - pairs requests through the shared waiting pool.
//!
//! ```text
//! request_match(requester, profile)
//!     │
//!     ├─► CHECKING  list() → requester already waiting? attach to that entry
//!     ├─► CLAIMING  first compatible unmatched entry → mark_matched → DONE
//!     ├─► WAITING   insert own entry
//!     └─► POLLING   get_by_key(own) with backoff (woken early by the claimer)
//!                   until matched → remove → DONE, or timeout / cancel → withdraw
//!                   │
//!                   ├─ attached entry vanished → back to CHECKING
//!                   └─ older compatible entry appeared → withdraw own → claim it
//! ```
//!
//! The pool is the only shared state. Claims are conditional, so two requests
//! racing for the same candidate cannot both win; the loser moves on to the
//! next candidate in its snapshot. Every pass through CHECKING shares the
//! deadline set when the request arrived.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::common::{ConversationId, EntryKey};
use crate::domains::matching::error::{MatchError, PoolError};
use crate::domains::matching::models::{
    conversation_id_for, MatchResult, ProfileSnapshot, WaitingEntry, Withdrawal,
};
use crate::kernel::{BaseCompatibility, BaseWaitingPool, StreamHub};

/// Tuning for the waiting side of the protocol.
#[derive(Debug, Clone)]
pub struct MatchmakingConfig {
    /// How long a request may wait in the pool before giving up
    pub match_timeout: Duration,
    /// First poll delay
    pub poll_min_interval: Duration,
    /// Poll delay cap
    pub poll_max_interval: Duration,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            match_timeout: Duration::from_secs(60),
            poll_min_interval: Duration::from_millis(100),
            poll_max_interval: Duration::from_secs(2),
        }
    }
}

/// Topic the claimer publishes on to wake the owner of `key`.
pub fn match_topic(key: EntryKey) -> String {
    format!("match:{key}")
}

/// Doubling delay between polls, capped.
#[derive(Debug)]
pub(crate) struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub(crate) fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(Duration::from_millis(1));
        Self {
            next: min,
            max: max.max(min),
        }
    }

    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2).min(self.max);
        delay
    }
}

enum Step {
    Done(ConversationId),
    Poll(EntryGuard),
}

/// How a polling pass ended without an error
enum Polled {
    Matched(ConversationId),
    /// The entry is gone but the request still has time: check the pool again
    Recheck,
}

/// Handle on the entry a request is polling.
///
/// An owned entry that is still armed when the guard drops (the request
/// future was abandoned) is withdrawn from a spawned task.
struct EntryGuard {
    key: EntryKey,
    pool: Arc<dyn BaseWaitingPool>,
    owned: bool,
    armed: bool,
}

impl EntryGuard {
    fn owned(key: EntryKey, pool: Arc<dyn BaseWaitingPool>) -> Self {
        Self {
            key,
            pool,
            owned: true,
            armed: true,
        }
    }

    /// Entry inserted by another in-flight request of the same member
    fn attached(key: EntryKey, pool: Arc<dyn BaseWaitingPool>) -> Self {
        Self {
            key,
            pool,
            owned: false,
            armed: false,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for EntryGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let key = self.key;
        let pool = self.pool.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match pool.withdraw(key).await {
                        Ok(Withdrawal::AlreadyMatched(conversation_id)) => {
                            warn!(
                                entry_key = %key,
                                conversation_id = %conversation_id,
                                "abandoned request was claimed; dropping entry"
                            );
                            if let Err(e) = pool.remove(key).await {
                                warn!(entry_key = %key, error = %e, "failed to remove abandoned entry");
                            }
                        }
                        Ok(outcome) => {
                            debug!(entry_key = %key, ?outcome, "withdrew abandoned waiting entry")
                        }
                        Err(e) => {
                            warn!(entry_key = %key, error = %e, "failed to withdraw abandoned entry")
                        }
                    }
                });
            }
            Err(_) => warn!(entry_key = %key, "no runtime to withdraw abandoned waiting entry"),
        }
    }
}

/// Cancellation bookkeeping for one member's in-flight requests
struct Tracked {
    generation: u64,
    token: CancellationToken,
    requests: usize,
}

/// Registration of one request; unregisters on drop.
struct InFlightRequest<'a> {
    registry: &'a Mutex<HashMap<String, Tracked>>,
    requester_id: String,
    generation: u64,
    token: CancellationToken,
}

impl Drop for InFlightRequest<'_> {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tracked) = registry.get_mut(&self.requester_id) {
            // A cancel may have replaced the slot with a newer generation
            if tracked.generation == self.generation {
                tracked.requests -= 1;
                if tracked.requests == 0 {
                    registry.remove(&self.requester_id);
                }
            }
        }
    }
}

/// Runs the pairing protocol for incoming requests.
pub struct MatchCoordinator {
    pool: Arc<dyn BaseWaitingPool>,
    compatibility: Arc<dyn BaseCompatibility>,
    stream_hub: StreamHub,
    config: MatchmakingConfig,
    in_flight: Mutex<HashMap<String, Tracked>>,
    generations: AtomicU64,
}

impl MatchCoordinator {
    pub fn new(
        pool: Arc<dyn BaseWaitingPool>,
        compatibility: Arc<dyn BaseCompatibility>,
        stream_hub: StreamHub,
        config: MatchmakingConfig,
    ) -> Self {
        Self {
            pool,
            compatibility,
            stream_hub,
            config,
            in_flight: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &Arc<dyn BaseWaitingPool> {
        &self.pool
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    /// Whether any request of this member is currently running
    pub fn is_in_flight(&self, requester_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(requester_id)
    }

    /// Pair the requester with a compatible member.
    ///
    /// Returns immediately when a compatible member is already waiting;
    /// otherwise waits in the pool until claimed, cancelled, or
    /// `match_timeout` elapses.
    pub async fn request_match(
        &self,
        requester_id: &str,
        profile: &ProfileSnapshot,
    ) -> Result<ConversationId, MatchError> {
        let request = self.track(requester_id);
        let deadline = Instant::now() + self.config.match_timeout;
        debug!(requester = %requester_id, "matchmaking request received");

        loop {
            let guard = match self.check_and_claim(requester_id, profile).await? {
                Step::Done(conversation_id) => return Ok(conversation_id),
                Step::Poll(guard) => guard,
            };

            let topic = match_topic(guard.key);
            let polled = self
                .poll(guard, &topic, requester_id, profile, &request.token, deadline)
                .await;
            self.stream_hub.release(&topic).await;

            match polled? {
                Polled::Matched(conversation_id) => return Ok(conversation_id),
                Polled::Recheck if request.token.is_cancelled() => {
                    return Err(MatchError::Cancelled)
                }
                Polled::Recheck if Instant::now() >= deadline => {
                    return Err(MatchError::NotMatchedYet)
                }
                Polled::Recheck => {
                    debug!(requester = %requester_id, "waiting entry gone, checking the pool again")
                }
            }
        }
    }

    /// Stop every in-flight request of the member and withdraw its entries.
    ///
    /// Returns how many waiting entries were removed. Entries that were
    /// claimed in the meantime are left for their owner to collect.
    pub async fn cancel(&self, requester_id: &str) -> Result<usize, MatchError> {
        let tracked = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(requester_id);
        if let Some(tracked) = tracked {
            tracked.token.cancel();
        }

        let entries = self
            .pool
            .find_by_requester(requester_id)
            .await
            .map_err(MatchError::Unavailable)?;

        let mut withdrawn = 0;
        for entry in entries {
            let outcome = self
                .pool
                .withdraw(entry.entry_key)
                .await
                .map_err(MatchError::Unavailable)?;
            if outcome == Withdrawal::Removed {
                withdrawn += 1;
            }
        }

        info!(requester = %requester_id, withdrawn, "matchmaking cancelled");
        Ok(withdrawn)
    }

    fn track(&self, requester_id: &str) -> InFlightRequest<'_> {
        let mut registry = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let tracked = registry
            .entry(requester_id.to_string())
            .or_insert_with(|| Tracked {
                generation: self.generations.fetch_add(1, Ordering::Relaxed),
                token: CancellationToken::new(),
                requests: 0,
            });
        tracked.requests += 1;

        InFlightRequest {
            registry: &self.in_flight,
            requester_id: requester_id.to_string(),
            generation: tracked.generation,
            token: tracked.token.child_token(),
        }
    }

    /// CHECKING → CLAIMING → (DONE | WAITING)
    async fn check_and_claim(
        &self,
        requester_id: &str,
        profile: &ProfileSnapshot,
    ) -> Result<Step, MatchError> {
        let snapshot = self.pool.list().await.map_err(MatchError::Unavailable)?;

        if let Some(existing) = snapshot.iter().find(|e| e.requester_id == requester_id) {
            debug!(requester = %requester_id, entry_key = %existing.entry_key, "already waiting, attaching");
            return Ok(Step::Poll(EntryGuard::attached(existing.entry_key, self.pool.clone())));
        }

        let candidates = snapshot.iter().filter(|e| {
            e.requester_id != requester_id
                && !e.match_result.is_matched()
                && self.compatibility.is_compatible(profile, &e.profile)
        });

        for candidate in candidates {
            if let Some(conversation_id) = self.claim(requester_id, candidate).await? {
                return Ok(Step::Done(conversation_id));
            }
        }

        match self.pool.insert(requester_id, profile).await {
            Ok(key) => {
                info!(requester = %requester_id, entry_key = %key, "no compatible member waiting, joined pool");
                Ok(Step::Poll(EntryGuard::owned(key, self.pool.clone())))
            }
            Err(PoolError::DuplicateEntry(existing)) => {
                debug!(requester = %requester_id, entry_key = %existing, "concurrent request inserted first, attaching");
                Ok(Step::Poll(EntryGuard::attached(existing, self.pool.clone())))
            }
            Err(e) => Err(MatchError::Unavailable(e)),
        }
    }

    /// Conditionally claim one candidate; `None` if someone else got there first.
    async fn claim(
        &self,
        requester_id: &str,
        candidate: &WaitingEntry,
    ) -> Result<Option<ConversationId>, MatchError> {
        let conversation_id = conversation_id_for(requester_id, &candidate.requester_id);

        match self.pool.mark_matched(candidate.entry_key, &conversation_id).await {
            Ok(()) => {
                self.stream_hub
                    .publish(&match_topic(candidate.entry_key), matched_message(&conversation_id))
                    .await;
                info!(
                    requester = %requester_id,
                    partner = %candidate.requester_id,
                    conversation_id = %conversation_id,
                    "claimed waiting member"
                );
                Ok(Some(conversation_id))
            }
            Err(e @ (PoolError::NotFound(_) | PoolError::AlreadyClaimed(_))) => {
                debug!(requester = %requester_id, error = %e, "candidate no longer available");
                Ok(None)
            }
            Err(e) => Err(MatchError::Unavailable(e)),
        }
    }

    /// Look for compatible entries older than our own.
    ///
    /// Two members can both insert after seeing each other's snapshot empty.
    /// Only the newer entry acts, so the pair does not leave at once. It leaves
    /// the pool before claiming, so the member never ends up in two
    /// conversations.
    async fn rescan(
        &self,
        guard: &mut EntryGuard,
        topic: &str,
        requester_id: &str,
        profile: &ProfileSnapshot,
        cancel: &CancellationToken,
    ) -> Result<Option<Polled>, MatchError> {
        let key = guard.key;
        let snapshot = match self.pool.list().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(entry_key = %key, error = %e, "rescan read failed");
                return Ok(None);
            }
        };

        let older: Vec<&WaitingEntry> = snapshot
            .iter()
            .take_while(|e| e.entry_key != key)
            .filter(|e| {
                e.requester_id != requester_id
                    && !e.match_result.is_matched()
                    && self.compatibility.is_compatible(profile, &e.profile)
            })
            .collect();
        if older.is_empty() {
            return Ok(None);
        }

        match self.pool.withdraw(key).await {
            Ok(Withdrawal::AlreadyMatched(conversation_id)) => {
                guard.disarm();
                self.remove_matched(key).await;
                return Ok(Some(Polled::Matched(conversation_id)));
            }
            Ok(_) => guard.disarm(),
            Err(e) => {
                warn!(entry_key = %key, error = %e, "failed to leave pool for rescan");
                return Ok(None);
            }
        }
        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled);
        }
        debug!(entry_key = %key, candidates = older.len(), "left pool to claim an older entry");

        for candidate in older {
            if let Some(conversation_id) = self.claim(requester_id, candidate).await? {
                // Requests attached to the withdrawn entry follow along
                self.stream_hub
                    .publish(topic, matched_message(&conversation_id))
                    .await;
                return Ok(Some(Polled::Matched(conversation_id)));
            }
        }
        Ok(Some(Polled::Recheck))
    }

    /// POLLING → DONE, or give up on timeout / cancel
    async fn poll(
        &self,
        mut guard: EntryGuard,
        topic: &str,
        requester_id: &str,
        profile: &ProfileSnapshot,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<Polled, MatchError> {
        let key = guard.key;
        let mut wake = self.stream_hub.subscribe(topic).await;
        let mut backoff =
            Backoff::new(self.config.poll_min_interval, self.config.poll_max_interval);
        let mut next_rescan = Instant::now() + self.config.poll_max_interval;
        let mut announced: Option<ConversationId> = None;

        loop {
            match self.pool.get_by_key(key).await {
                Ok(Some(entry)) => {
                    if let MatchResult::Matched(conversation_id) = entry.match_result {
                        guard.disarm();
                        self.remove_matched(key).await;
                        info!(entry_key = %key, conversation_id = %conversation_id, "waiting member was matched");
                        return Ok(Polled::Matched(conversation_id));
                    }

                    if guard.owned && Instant::now() >= next_rescan {
                        next_rescan = Instant::now() + self.config.poll_max_interval;
                        if let Some(polled) = self.rescan(&mut guard, topic, requester_id, profile, cancel).await? {
                            return Ok(polled);
                        }
                    }
                }
                Ok(None) => {
                    guard.disarm();
                    if cancel.is_cancelled() {
                        return Err(MatchError::Cancelled);
                    }
                    // Another request of the same member collected the match first
                    if let Some(conversation_id) = announced.or_else(|| drain_announcement(&mut wake)) {
                        info!(entry_key = %key, conversation_id = %conversation_id, "shared entry was matched");
                        return Ok(Polled::Matched(conversation_id));
                    }
                    if guard.owned {
                        debug!(entry_key = %key, "waiting entry disappeared while polling");
                        return Err(MatchError::Withdrawn);
                    }

                    // The owner left; give it a moment to announce a claim made on the way out
                    tokio::time::sleep(self.config.poll_min_interval).await;
                    if let Some(conversation_id) = drain_announcement(&mut wake) {
                        info!(entry_key = %key, conversation_id = %conversation_id, "shared entry was matched");
                        return Ok(Polled::Matched(conversation_id));
                    }
                    return Ok(Polled::Recheck);
                }
                Err(e) => warn!(entry_key = %key, error = %e, "poll read failed, retrying"),
            }

            let delay = backoff.next_delay();
            tokio::select! {
                _ = cancel.cancelled() => {
                    return self.give_up(guard, MatchError::Cancelled).await.map(Polled::Matched);
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return self.give_up(guard, MatchError::NotMatchedYet).await.map(Polled::Matched);
                }
                _ = tokio::time::sleep(delay) => {}
                message = wake.recv() => {
                    if let Ok(value) = message {
                        announced = announced.or_else(|| announced_conversation(&value));
                    }
                }
            }
        }
    }

    /// Leave the pool, unless a claim landed at the last moment.
    async fn give_up(
        &self,
        mut guard: EntryGuard,
        reason: MatchError,
    ) -> Result<ConversationId, MatchError> {
        if !guard.owned {
            return Err(reason);
        }

        let key = guard.key;
        match self.pool.withdraw(key).await {
            Ok(Withdrawal::AlreadyMatched(conversation_id)) => {
                guard.disarm();
                self.remove_matched(key).await;
                info!(entry_key = %key, conversation_id = %conversation_id, "match arrived while leaving pool");
                Ok(conversation_id)
            }
            Ok(_) => {
                guard.disarm();
                info!(entry_key = %key, reason = %reason, "left waiting pool");
                Err(reason)
            }
            Err(e) => {
                // Guard stays armed and retries the withdrawal on drop
                warn!(entry_key = %key, error = %e, "failed to withdraw waiting entry");
                Err(reason)
            }
        }
    }

    async fn remove_matched(&self, key: EntryKey) {
        if let Err(e) = self.pool.remove(key).await {
            warn!(entry_key = %key, error = %e, "failed to remove matched entry");
        }
    }
}

/// Wake-up published to the owner of a claimed entry
fn matched_message(conversation_id: &ConversationId) -> serde_json::Value {
    serde_json::json!({
        "type": "matched",
        "conversation_id": conversation_id,
    })
}

/// Conversation id carried by a claimer's wake-up message
fn announced_conversation(value: &serde_json::Value) -> Option<ConversationId> {
    value
        .get("conversation_id")
        .and_then(|c| c.as_str())
        .map(ConversationId::new)
}

/// Read any wake-ups still queued on the receiver
fn drain_announcement(
    wake: &mut broadcast::Receiver<serde_json::Value>,
) -> Option<ConversationId> {
    let mut found = None;
    loop {
        match wake.try_recv() {
            Ok(value) => found = found.or_else(|| announced_conversation(&value)),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_until_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(350));
        let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 350, 350, 350]);
    }

    #[test]
    fn test_backoff_never_spins() {
        let mut backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert!(backoff.next_delay() >= Duration::from_millis(1));
    }

    #[test]
    fn test_announcement_is_read_from_queued_wake_ups() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(serde_json::json!({ "type": "other" })).unwrap();
        tx.send(serde_json::json!({ "type": "matched", "conversation_id": "abc" }))
            .unwrap();

        assert_eq!(drain_announcement(&mut rx), Some(ConversationId::new("abc")));
        assert_eq!(drain_announcement(&mut rx), None);
    }

    #[test]
    fn test_default_config_is_bounded() {
        let config = MatchmakingConfig::default();
        assert!(config.poll_min_interval <= config.poll_max_interval);
        assert!(config.match_timeout > config.poll_max_interval);
    }
}
