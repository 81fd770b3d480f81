//! The authoritative election ledger.
//!
//! [`ElectionLedger`] is the single entry point for every command and query.
//! It authorizes administrative commands, hands the command to a
//! [`LedgerStore`] which applies it to the [`Election`] state machine under
//! exclusive access, and signs a [`Receipt`] for whatever was committed.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::error::{Error, Result};
use crate::model::common::{
    election::{ElectionId, ElectionName, PartyName, Revision},
    identity::Identity,
};

mod election;
mod memory;
mod mongo;
mod party_registry;
mod receipt;
mod vote_tally;

pub use election::{Command, Election, ElectionDetails, ElectionResults, ElectionSummary};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use party_registry::{Party, PartyRegistry};
pub use receipt::{Action, Receipt, ReceiptSigner};
pub use vote_tally::VoteTally;

/// Storage backend for elections.
///
/// Implementations must apply each command to one election atomically and in
/// a single total order, and must serve snapshots that reflect some point in
/// that order.
#[rocket::async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a brand new election, failing if the ID is already taken.
    async fn insert(&self, election: Election) -> Result<()>;

    /// Apply a command to an existing election, returning its new revision.
    async fn apply(&self, election_id: &ElectionId, command: Command) -> Result<Revision>;

    /// A consistent copy of one election.
    async fn snapshot(&self, election_id: &ElectionId) -> Result<Election>;

    /// Summaries of all elections ordered by ID, optionally only those that
    /// are (or are not) still active.
    async fn summaries(&self, active: Option<bool>) -> Result<Vec<ElectionSummary>>;
}

/// Who may create elections, add parties and close elections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    admins: BTreeSet<Identity>,
}

impl AdminPolicy {
    /// Any caller is an administrator.
    pub fn open() -> Self {
        Self::default()
    }

    /// Only the given identities are administrators.
    /// An empty list is the same as [`AdminPolicy::open`].
    pub fn restricted(admins: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.admins.is_empty()
    }

    pub fn authorize(&self, caller: &Identity) -> Result<()> {
        if self.is_open() || self.admins.contains(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized(caller.clone()))
        }
    }
}

/// The election ledger. Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct ElectionLedger {
    store: Arc<dyn LedgerStore>,
    policy: Arc<AdminPolicy>,
    signer: ReceiptSigner,
}

impl ElectionLedger {
    pub fn new(store: impl LedgerStore + 'static, policy: AdminPolicy, signer: ReceiptSigner) -> Self {
        Self {
            store: Arc::new(store),
            policy: Arc::new(policy),
            signer,
        }
    }

    /// A ledger backed by a fresh [`MemoryStore`].
    pub fn in_memory(policy: AdminPolicy, signer: ReceiptSigner) -> Self {
        Self::new(MemoryStore::new(), policy, signer)
    }

    pub fn signer(&self) -> &ReceiptSigner {
        &self.signer
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    pub async fn create_election(
        &self,
        election_id: ElectionId,
        name: ElectionName,
        caller: Identity,
    ) -> Result<Receipt> {
        self.policy.authorize(&caller)?;
        let election = Election::new(election_id.clone(), name, caller.clone());
        let revision = election.revision;
        let name = election.name.clone();
        self.store.insert(election).await?;
        info!("Created election {election_id} ('{name}') for {caller}");
        Ok(self.receipt(election_id, Action::CreateElection, caller, revision))
    }

    pub async fn add_party(
        &self,
        election_id: &ElectionId,
        party: PartyName,
        caller: Identity,
    ) -> Result<Receipt> {
        self.policy.authorize(&caller)?;
        let receipt = self
            .commit(election_id, Command::AddParty(party.clone()), caller)
            .await?;
        info!("Registered party '{party}' in election {election_id}");
        Ok(receipt)
    }

    /// Cast `voter`'s single vote for `party`. Voting needs no administrator.
    pub async fn vote(
        &self,
        election_id: &ElectionId,
        party: PartyName,
        voter: Identity,
    ) -> Result<Receipt> {
        let command = Command::Vote {
            party,
            voter: voter.clone(),
        };
        let receipt = self.commit(election_id, command, voter).await?;
        debug!(
            "Recorded vote in election {election_id} at revision {}",
            receipt.revision
        );
        Ok(receipt)
    }

    pub async fn end_election(&self, election_id: &ElectionId, caller: Identity) -> Result<Receipt> {
        self.policy.authorize(&caller)?;
        let receipt = self.commit(election_id, Command::End, caller).await?;
        info!("Closed election {election_id}");
        Ok(receipt)
    }

    /// Current tally, live while the election is open.
    pub async fn results(&self, election_id: &ElectionId) -> Result<ElectionResults> {
        Ok(self.store.snapshot(election_id).await?.results())
    }

    pub async fn details(&self, election_id: &ElectionId) -> Result<ElectionDetails> {
        Ok(self.store.snapshot(election_id).await?.details())
    }

    pub async fn elections(&self, active: Option<bool>) -> Result<Vec<ElectionSummary>> {
        self.store.summaries(active).await
    }

    async fn commit(
        &self,
        election_id: &ElectionId,
        command: Command,
        actor: Identity,
    ) -> Result<Receipt> {
        let action = command.action();
        let revision = self.store.apply(election_id, command).await?;
        Ok(self.receipt(election_id.clone(), action, actor, revision))
    }

    fn receipt(
        &self,
        election_id: ElectionId,
        action: Action,
        actor: Identity,
        revision: Revision,
    ) -> Receipt {
        self.signer
            .sign(election_id, action, actor, revision, Utc::now())
    }
}
