//! Waiting pool backends.

mod memory;
mod postgres;

pub use memory::InMemoryWaitingPool;
pub use postgres::PostgresWaitingPool;
