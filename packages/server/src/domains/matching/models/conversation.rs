use sha2::{Digest, Sha256};

use crate::common::ConversationId;

/// Derive the conversation id shared by two participants.
///
/// Identities are sorted first, so both sides of a pairing compute the same
/// token regardless of which one claimed the other. The digest keeps raw
/// e-mail addresses out of chat URLs.
pub fn conversation_id_for(a: &str, b: &str) -> ConversationId {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    // Separator keeps ("ab", "c") and ("a", "bc") apart
    hasher.update([0u8]);
    hasher.update(second.as_bytes());

    ConversationId::new(hex::encode(hasher.finalize()))
}
