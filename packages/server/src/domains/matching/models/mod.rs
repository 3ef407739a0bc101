pub mod conversation;
pub mod waiting_entry;

pub use conversation::conversation_id_for;
pub use waiting_entry::{MatchResult, ProfileSnapshot, WaitingEntry, WaitingEntryRow, Withdrawal};
