use serde::{Deserialize, Serialize};

use crate::model::common::election::{PartyName, VoteCount};

/// A candidate within one election, carrying its own vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub vote_count: VoteCount,
}

impl Party {
    fn new(name: PartyName) -> Self {
        Self {
            name,
            vote_count: 0,
        }
    }
}

/// Append-only, insertion-ordered collection of uniquely named parties.
///
/// The enumeration order is shared by results and details listings, so
/// parties are never removed or reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyRegistry {
    parties: Vec<Party>,
}

impl PartyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &PartyName) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &PartyName) -> Option<&Party> {
        self.parties.iter().find(|p| &p.name == name)
    }

    pub fn get_mut(&mut self, name: &PartyName) -> Option<&mut Party> {
        self.parties.iter_mut().find(|p| &p.name == name)
    }

    /// Append a party with no votes. Returns false if the name is taken.
    pub fn register(&mut self, name: PartyName) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.parties.push(Party::new(name));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Party> {
        self.parties.iter()
    }

    pub fn names(&self) -> Vec<PartyName> {
        self.iter().map(|p| p.name.clone()).collect()
    }

    pub fn vote_counts(&self) -> Vec<VoteCount> {
        self.iter().map(|p| p.vote_count).collect()
    }

    pub fn total_votes(&self) -> VoteCount {
        self.iter().map(|p| p.vote_count).sum()
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }
}
