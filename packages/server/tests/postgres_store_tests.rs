//! Postgres store tests.
//!
//! Run against a shared testcontainers database, so every test uses its own
//! requester ids and e-mails.

mod common;

use std::time::Duration;

use agree_core::common::ConversationId;
use agree_core::domains::matching::models::{
    conversation_id_for, MatchResult, ProfileSnapshot, Withdrawal,
};
use agree_core::domains::matching::{
    MatchError, MatchmakingConfig, OpposingViewsCompatibility, PoolError,
};
use agree_core::domains::member::models::NewMember;
use agree_core::kernel::scheduled_tasks::prune_stale_entries;
use agree_core::kernel::{BaseCompatibility, BaseMemberStore, BaseMessageLog, BaseWaitingPool};
use common::{profile, TestHarness};
use test_context::test_context;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

// ============================================================================
// Waiting pool
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_insert_rejects_second_entry_for_requester(ctx: &TestHarness) {
    let pool = &ctx.pool;
    let requester = unique("dup");

    let key = pool
        .insert(&requester, &profile("dup", "red", &[]))
        .await
        .unwrap();
    let err = pool
        .insert(&requester, &profile("dup", "red", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::DuplicateEntry(existing) if existing == key));
    assert_eq!(pool.find_by_requester(&requester).await.unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_entry_round_trips_profile(ctx: &TestHarness) {
    let pool = &ctx.pool;
    let requester = unique("profile");
    let snapshot = profile("profile", "blue", &["healthcare", "education"]);

    let key = pool.insert(&requester, &snapshot).await.unwrap();
    let entry = pool.get_by_key(key).await.unwrap().unwrap();

    assert_eq!(entry.requester_id, requester);
    assert_eq!(entry.profile, snapshot);
    assert_eq!(entry.match_result, MatchResult::Unmatched);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_claim_is_conditional(ctx: &TestHarness) {
    let pool = &ctx.pool;
    let key = pool
        .insert(&unique("claim"), &profile("claim", "red", &[]))
        .await
        .unwrap();

    let first = ConversationId::new(Uuid::new_v4().to_string());
    let second = ConversationId::new(Uuid::new_v4().to_string());

    pool.mark_matched(key, &first).await.unwrap();
    let err = pool.mark_matched(key, &second).await.unwrap_err();
    assert!(matches!(err, PoolError::AlreadyClaimed(_)));

    let entry = pool.get_by_key(key).await.unwrap().unwrap();
    assert_eq!(entry.match_result, MatchResult::Matched(first));

    pool.remove(key).await.unwrap();
    let err = pool.mark_matched(key, &second).await.unwrap_err();
    assert!(matches!(err, PoolError::NotFound(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_withdraw_leaves_claimed_entries(ctx: &TestHarness) {
    let pool = &ctx.pool;

    let open = pool
        .insert(&unique("open"), &profile("open", "red", &[]))
        .await
        .unwrap();
    assert_eq!(pool.withdraw(open).await.unwrap(), Withdrawal::Removed);
    assert_eq!(pool.withdraw(open).await.unwrap(), Withdrawal::Absent);

    let claimed = pool
        .insert(&unique("claimed"), &profile("claimed", "red", &[]))
        .await
        .unwrap();
    let conversation_id = ConversationId::new(Uuid::new_v4().to_string());
    pool.mark_matched(claimed, &conversation_id).await.unwrap();

    assert_eq!(
        pool.withdraw(claimed).await.unwrap(),
        Withdrawal::AlreadyMatched(conversation_id)
    );
    assert!(pool.get_by_key(claimed).await.unwrap().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_list_is_oldest_first(ctx: &TestHarness) {
    let pool = &ctx.pool;

    let first = pool
        .insert(&unique("first"), &profile("first", "red", &[]))
        .await
        .unwrap();
    let second = pool
        .insert(&unique("second"), &profile("second", "red", &[]))
        .await
        .unwrap();

    let keys: Vec<_> = pool
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.entry_key)
        .filter(|k| *k == first || *k == second)
        .collect();
    assert_eq!(keys, vec![first, second]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_prune_removes_entries_past_cutoff(ctx: &TestHarness) {
    let pool = &ctx.pool;
    let stale = pool
        .insert(&unique("stale"), &profile("stale", "red", &[]))
        .await
        .unwrap();
    let fresh = pool
        .insert(&unique("fresh"), &profile("fresh", "red", &[]))
        .await
        .unwrap();

    // Age one entry past the cutoff; entries of concurrent tests stay newer
    sqlx::query(
        "UPDATE matchmaking_entries SET created_at = created_at - INTERVAL '1 hour' WHERE entry_key = $1",
    )
    .bind(stale)
    .execute(&ctx.db_pool)
    .await
    .unwrap();

    let cutoff = chrono::Utc::now() - chrono::Duration::minutes(30);
    let pruned = prune_stale_entries(pool, cutoff).await.unwrap();

    assert!(pruned >= 1);
    assert!(pool.get_by_key(stale).await.unwrap().is_none());
    assert!(pool.get_by_key(fresh).await.unwrap().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_coordinator_pairs_over_postgres(ctx: &TestHarness) {
    // Only pair the two members of this test
    let coordinator = ctx.coordinator(
        |a: &ProfileSnapshot, b: &ProfileSnapshot| {
            a.username.starts_with("pg-pair")
                && b.username.starts_with("pg-pair")
                && OpposingViewsCompatibility.is_compatible(a, b)
        },
        MatchmakingConfig {
            match_timeout: Duration::from_secs(5),
            poll_min_interval: Duration::from_millis(10),
            poll_max_interval: Duration::from_millis(100),
        },
    );
    let waiter_id = unique("waiter");
    let claimer_id = unique("claimer");

    let waiter = {
        let coordinator = coordinator.clone();
        let waiter_id = waiter_id.clone();
        tokio::spawn(async move {
            coordinator
                .request_match(&waiter_id, &profile("pg-pair-waiter", "blue", &[]))
                .await
        })
    };

    let pool = &ctx.pool;
    common::wait_until(Duration::from_secs(5), || {
        let waiter_id = waiter_id.clone();
        async move { !pool.find_by_requester(&waiter_id).await.unwrap().is_empty() }
    })
    .await;

    let claimed = coordinator
        .request_match(&claimer_id, &profile("pg-pair-claimer", "red", &[]))
        .await
        .unwrap();
    let observed: Result<ConversationId, MatchError> = waiter.await.unwrap();

    assert_eq!(observed.unwrap(), claimed);
    assert_eq!(claimed, conversation_id_for(&waiter_id, &claimer_id));
    assert!(pool.find_by_requester(&waiter_id).await.unwrap().is_empty());
}

// ============================================================================
// Members and messages
// ============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn test_member_store_finds_by_email_and_username(ctx: &TestHarness) {
    let store = &ctx.members;
    let email = unique("member");
    let username = format!("member-{}", Uuid::new_v4());

    let member = store
        .insert(NewMember {
            username: username.clone(),
            email: email.clone(),
            password_hash: "hash".to_string(),
            party: "green".to_string(),
            avatar: None,
            interests: vec!["education".to_string()],
            profile_messages: vec!["Schools first".to_string()],
        })
        .await
        .unwrap();

    let by_email = store.find_by_email(&email).await.unwrap().unwrap();
    assert_eq!(by_email.id, member.id);
    assert_eq!(by_email.interests, vec!["education".to_string()]);

    let by_username = store.find_by_username(&username).await.unwrap().unwrap();
    assert_eq!(by_username.email, email);

    assert!(store.find_by_email(&unique("missing")).await.unwrap().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_message_log_returns_latest_in_order(ctx: &TestHarness) {
    let log = &ctx.messages;
    let conversation_id = ConversationId::new(Uuid::new_v4().to_string());

    for i in 0..5 {
        log.append(&conversation_id, "alice", &format!("line {i}"))
            .await
            .unwrap();
    }

    let recent = log.recent(&conversation_id, 3).await.unwrap();
    let bodies: Vec<_> = recent.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["line 2", "line 3", "line 4"]);

    assert_eq!(log.clear(&conversation_id).await.unwrap(), 5);
    assert!(log.recent(&conversation_id, 3).await.unwrap().is_empty());
}
