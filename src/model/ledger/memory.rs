use std::collections::{btree_map::Entry, BTreeMap};
use std::sync::Arc;

use rocket::tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::model::common::election::{ElectionId, Revision};

use super::{Command, Election, ElectionSummary, LedgerStore};

type Slot = Arc<RwLock<Election>>;

/// An in-process, non-durable store.
///
/// Each election sits behind its own lock: commands hold it exclusively for
/// their whole validate-and-mutate step, queries share it. The outer map lock
/// is only held long enough to find or insert a slot, so elections never
/// contend with each other.
#[derive(Default)]
pub struct MemoryStore {
    elections: RwLock<BTreeMap<ElectionId, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, election_id: &ElectionId) -> Result<Slot> {
        self.elections
            .read()
            .await
            .get(election_id)
            .cloned()
            .ok_or_else(|| Error::ElectionNotFound(election_id.clone()))
    }
}

#[rocket::async_trait]
impl LedgerStore for MemoryStore {
    async fn insert(&self, election: Election) -> Result<()> {
        let mut elections = self.elections.write().await;
        match elections.entry(election.id.clone()) {
            Entry::Occupied(entry) => Err(Error::DuplicateElection(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(RwLock::new(election)));
                Ok(())
            }
        }
    }

    async fn apply(&self, election_id: &ElectionId, command: Command) -> Result<Revision> {
        let slot = self.slot(election_id).await?;
        let mut election = slot.write().await;
        election.apply(command)
    }

    async fn snapshot(&self, election_id: &ElectionId) -> Result<Election> {
        let slot = self.slot(election_id).await?;
        let election = slot.read().await;
        Ok(election.clone())
    }

    async fn summaries(&self, active: Option<bool>) -> Result<Vec<ElectionSummary>> {
        let slots: Vec<Slot> = self.elections.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            let election = slot.read().await;
            if active.map_or(true, |active| election.is_active() == active) {
                summaries.push(election.summary());
            }
        }
        Ok(summaries)
    }
}
