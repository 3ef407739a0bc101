//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod scheduled_tasks;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use scheduled_tasks::start_scheduler;
pub use stream_hub::StreamHub;
pub use test_dependencies::TestDependencies;
pub use traits::*;
