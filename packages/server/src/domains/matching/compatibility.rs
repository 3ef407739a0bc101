//! Default compatibility predicate.
//!
//! The pairing rule is a replaceable collaborator (`BaseCompatibility`); this
//! one pairs people who vote differently but care about at least one of the
//! same issues.

use crate::domains::matching::models::ProfileSnapshot;
use crate::kernel::BaseCompatibility;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpposingViewsCompatibility;

impl BaseCompatibility for OpposingViewsCompatibility {
    fn is_compatible(&self, requester: &ProfileSnapshot, candidate: &ProfileSnapshot) -> bool {
        let requester_party = requester.party.trim();
        let candidate_party = candidate.party.trim();

        if requester_party.is_empty() || candidate_party.is_empty() {
            return false;
        }
        if requester_party.eq_ignore_ascii_case(candidate_party) {
            return false;
        }

        // No stated interests means any topic will do
        if requester.interests.is_empty() || candidate.interests.is_empty() {
            return true;
        }

        requester.interests.iter().any(|mine| {
            candidate
                .interests
                .iter()
                .any(|theirs| mine.trim().eq_ignore_ascii_case(theirs.trim()))
        })
    }
}
