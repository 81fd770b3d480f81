use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::common::{
    election::{ElectionId, ElectionName, ElectionState, PartyName, Revision, VoteCount},
    identity::Identity,
};

use super::{party_registry::PartyRegistry, receipt::Action, vote_tally::VoteTally};

/// A mutation of an existing election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddParty(PartyName),
    Vote { party: PartyName, voter: Identity },
    End,
}

impl Command {
    pub fn action(&self) -> Action {
        match self {
            Self::AddParty(_) => Action::AddParty,
            Self::Vote { .. } => Action::Vote,
            Self::End => Action::EndElection,
        }
    }
}

/// An election and everything it owns, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: ElectionId,
    /// Election name.
    pub name: ElectionName,
    /// Lifecycle state.
    pub state: ElectionState,
    /// Candidates, in registration order.
    pub parties: PartyRegistry,
    /// Who has voted.
    pub tally: VoteTally,
    /// The administrator that created the election.
    pub created_by: Identity,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Number of commands committed so far, including creation.
    pub revision: Revision,
}

impl Election {
    /// Create a new, open election with no parties.
    pub fn new(id: ElectionId, name: ElectionName, created_by: Identity) -> Self {
        Self {
            id,
            name,
            state: ElectionState::Open,
            parties: PartyRegistry::new(),
            tally: VoteTally::new(),
            created_by,
            created_at: Utc::now(),
            revision: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Validate and apply a command. On failure nothing is changed.
    pub fn apply(&mut self, command: Command) -> Result<Revision> {
        match command {
            Command::AddParty(party) => self.add_party(party)?,
            Command::Vote { party, voter } => self.vote(&party, voter)?,
            Command::End => self.end()?,
        }
        self.revision += 1;
        Ok(self.revision)
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            ElectionState::Open => Ok(()),
            ElectionState::Closed => Err(Error::ElectionClosed(self.id.clone())),
        }
    }

    fn add_party(&mut self, party: PartyName) -> Result<()> {
        self.ensure_open()?;
        if !self.parties.register(party.clone()) {
            return Err(Error::DuplicateParty {
                election: self.id.clone(),
                party,
            });
        }
        Ok(())
    }

    fn vote(&mut self, party: &PartyName, voter: Identity) -> Result<()> {
        self.ensure_open()?;
        let target = self
            .parties
            .get_mut(party)
            .ok_or_else(|| Error::PartyNotFound {
                election: self.id.clone(),
                party: party.clone(),
            })?;
        if self.tally.has_voted(&voter) {
            return Err(Error::DuplicateVote {
                election: self.id.clone(),
                voter,
            });
        }
        let recorded = self.tally.record(target, voter);
        debug_assert!(recorded);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if self.state == ElectionState::Closed {
            return Err(Error::AlreadyClosed(self.id.clone()));
        }
        self.state = ElectionState::Closed;
        Ok(())
    }

    pub fn results(&self) -> ElectionResults {
        ElectionResults {
            parties: self.parties.names(),
            results: self.parties.vote_counts(),
        }
    }

    pub fn details(&self) -> ElectionDetails {
        ElectionDetails {
            name: self.name.clone(),
            is_active: self.is_active(),
            parties: self.parties.names(),
        }
    }

    pub fn summary(&self) -> ElectionSummary {
        ElectionSummary {
            election_id: self.id.clone(),
            name: self.name.clone(),
            is_active: self.is_active(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            parties: self.parties.len(),
            turnout: self.tally.turnout(),
        }
    }
}

/// Party names and their vote counts, as parallel arrays in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub parties: Vec<PartyName>,
    pub results: Vec<VoteCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDetails {
    pub name: ElectionName,
    pub is_active: bool,
    pub parties: Vec<PartyName>,
}

/// A short description of an election, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub election_id: ElectionId,
    pub name: ElectionName,
    pub is_active: bool,
    pub created_by: Identity,
    pub created_at: DateTime<Utc>,
    pub parties: usize,
    pub turnout: u64,
}


#[cfg(test)]
mod tests {
    use super::*;

    fn party(s: &str) -> PartyName {
        PartyName::try_from(s).unwrap()
    }

    fn vote(p: &str, voter: usize) -> Command {
        Command::Vote {
            party: party(p),
            voter: Identity::voter(voter),
        }
    }

    #[test]
    fn new_election_is_open_and_empty() {
        let election = Election::example();
        assert!(election.is_active());
        assert_eq!(election.revision, 1);
        assert!(election.parties.is_empty());
        assert_eq!(election.tally.turnout(), 0);
        assert_eq!(election.created_by, Identity::admin());
    }

    #[test]
    fn duplicate_party() {
        let mut election = Election::example();
        assert_eq!(election.apply(Command::AddParty(party("Alice"))).unwrap(), 2);
        let err = election
            .apply(Command::AddParty(party("Alice")))
            .unwrap_err();
        assert!(matches!(&err, Error::DuplicateParty { party: p, .. } if *p == party("Alice")));
        assert_eq!(election.revision, 2);
        assert_eq!(election.parties.names(), vec![party("Alice")]);
        // Case differs, so it is a new party.
        assert_eq!(election.apply(Command::AddParty(party("alice"))).unwrap(), 3);
    }

    #[test]
    fn duplicate_vote_leaves_tally_unchanged() {
        let mut election = Election::example();
        election.apply(Command::AddParty(party("Alice"))).unwrap();
        election.apply(Command::AddParty(party("Bob"))).unwrap();
        election.apply(vote("Alice", 1)).unwrap();

        let before = election.clone();
        for p in ["Alice", "Bob"] {
            let err = election.apply(vote(p, 1)).unwrap_err();
            assert!(matches!(err, Error::DuplicateVote { .. }), "{err}");
        }
        assert_eq!(election, before);
        assert_eq!(election.results().results, vec![1, 0]);
    }

    #[test]
    fn vote_for_unknown_party() {
        let mut election = Election::example();
        election.apply(Command::AddParty(party("Alice"))).unwrap();
        let err = election.apply(vote("Carol", 1)).unwrap_err();
        assert!(matches!(err, Error::PartyNotFound { .. }));
        // The failed attempt does not use up the voter's vote.
        election.apply(vote("Alice", 1)).unwrap();
    }

    #[test]
    fn closed_election_is_immutable() {
        let mut election = Election::example();
        election.apply(Command::AddParty(party("Alice"))).unwrap();
        election.apply(vote("Alice", 1)).unwrap();
        election.apply(Command::End).unwrap();
        assert!(!election.is_active());

        let frozen = election.results();
        assert!(matches!(
            election.apply(Command::AddParty(party("Bob"))),
            Err(Error::ElectionClosed(_))
        ));
        assert!(matches!(
            election.apply(vote("Alice", 2)),
            Err(Error::ElectionClosed(_))
        ));
        assert!(matches!(
            election.apply(Command::End),
            Err(Error::AlreadyClosed(_))
        ));
        assert_eq!(election.results(), frozen);
        assert!(!election.details().is_active);
    }

    #[test]
    fn results_and_details_share_order() {
        let mut election = Election::example();
        for p in ["Zed", "Alice", "Mo"] {
            election.apply(Command::AddParty(party(p))).unwrap();
        }
        for (i, p) in ["Mo", "Zed", "Mo", "Alice", "Mo"].iter().enumerate() {
            election.apply(vote(p, i)).unwrap();
        }

        let results = election.results();
        let details = election.details();
        assert_eq!(results.parties, details.parties);
        assert_eq!(
            results.parties,
            vec![party("Zed"), party("Alice"), party("Mo")]
        );
        assert_eq!(results.results, vec![1, 1, 3]);
        assert_eq!(
            results.results.iter().sum::<u64>(),
            election.tally.turnout()
        );

        let summary = election.summary();
        assert_eq!(summary.parties, 3);
        assert_eq!(summary.turnout, 5);
        assert_eq!(election.revision, 1 + 3 + 5);
    }
}
