//! Postgres-backed test context.
//!
//! One testcontainers Postgres serves the whole test binary; it is started and
//! migrated on first use. Every test gets fresh store handles on that database,
//! so tests must pick their own requester ids and e-mails.

use std::sync::Arc;

use agree_core::domains::chatrooms::PostgresMessageLog;
use agree_core::domains::matching::{MatchCoordinator, MatchmakingConfig, PostgresWaitingPool};
use agree_core::domains::member::PostgresMemberStore;
use agree_core::kernel::{BaseCompatibility, StreamHub};
use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct Database {
    url: String,
    // Dropping the handle stops the container
    _container: ContainerAsync<Postgres>,
}

static DATABASE: OnceCell<Database> = OnceCell::const_new();

impl Database {
    async fn start() -> Result<Self> {
        init_tracing();

        let container = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            container.get_host().await?,
            container.get_host_port_ipv4(5432).await?
        );

        let pool = PgPool::connect(&url)
            .await
            .context("Failed to connect for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        pool.close().await;

        Ok(Self {
            url,
            _container: container,
        })
    }

    async fn shared() -> &'static Self {
        DATABASE
            .get_or_init(|| async {
                Self::start()
                    .await
                    .expect("Failed to start test database")
            })
            .await
    }
}

/// Tracing for tests; honours RUST_LOG (`RUST_LOG=agree_core=debug cargo test -- --nocapture`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Postgres stores for one test.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn claims_are_conditional(ctx: &TestHarness) {
///     let key = ctx.pool.insert("x@example.com", &profile).await?;
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub pool: PostgresWaitingPool,
    pub members: PostgresMemberStore,
    pub messages: PostgresMessageLog,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let database = Database::shared().await;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database.url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self {
            pool: PostgresWaitingPool::new(db_pool.clone()),
            members: PostgresMemberStore::new(db_pool.clone()),
            messages: PostgresMessageLog::new(db_pool.clone()),
            db_pool,
        })
    }

    /// Coordinator over this test's Postgres waiting pool
    pub fn coordinator(
        &self,
        rule: impl BaseCompatibility + 'static,
        config: MatchmakingConfig,
    ) -> Arc<MatchCoordinator> {
        Arc::new(MatchCoordinator::new(
            Arc::new(self.pool.clone()),
            Arc::new(rule),
            StreamHub::new(),
            config,
        ))
    }
}
