//! Matching domain - waiting pool and pairing protocol
//!
//! - `pool`: where waiting members live (Postgres, or in memory for tests)
//! - `compatibility`: default pairing predicate
//! - `coordinator`: the CHECKING → CLAIMING → WAITING → POLLING → DONE protocol
//! - `actions`: session-facing entry points used by the HTTP layer

pub mod actions;
pub mod compatibility;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod pool;

pub use compatibility::OpposingViewsCompatibility;
pub use coordinator::{MatchCoordinator, MatchmakingConfig};
pub use error::{MatchError, MatchmakingError, PoolError};
pub use pool::{InMemoryWaitingPool, PostgresWaitingPool};
