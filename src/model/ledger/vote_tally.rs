use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::common::identity::Identity;

use super::party_registry::Party;

/// The set of identities that have voted in one election.
///
/// Counts themselves live on each [`Party`]; the tally only guarantees that
/// a count is bumped exactly when a new identity is recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    has_voted: BTreeSet<Identity>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.has_voted.contains(voter)
    }

    /// Record `voter`'s vote for `party`.
    /// Returns false, changing nothing, if they have already voted.
    pub fn record(&mut self, party: &mut Party, voter: Identity) -> bool {
        if !self.has_voted.insert(voter) {
            return false;
        }
        party.vote_count += 1;
        true
    }

    /// Number of distinct identities that have voted.
    pub fn turnout(&self) -> u64 {
        self.has_voted.len() as u64
    }
}
