use log::debug;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, ElectionState, Revision},
    mongodb::{is_duplicate_key_error, Coll},
};

use super::{Command, Election, ElectionSummary, LedgerStore};

/// A single conditional update: it only matches while the command is still
/// valid against the stored election.
struct ConditionalUpdate {
    filter: Document,
    update: Document,
    array_filters: Option<Vec<Document>>,
}

impl ConditionalUpdate {
    fn for_command(election_id: &ElectionId, command: &Command) -> Self {
        match command {
            Command::AddParty(party) => Self {
                filter: doc! {
                    "_id": election_id.as_str(),
                    "state": ElectionState::Open,
                    "parties.name": { "$ne": party.as_str() },
                },
                update: doc! {
                    "$push": { "parties": { "name": party.as_str(), "vote_count": 0_i64 } },
                    "$inc": { "revision": 1_i64 },
                },
                array_filters: None,
            },
            Command::Vote { party, voter } => Self {
                filter: doc! {
                    "_id": election_id.as_str(),
                    "state": ElectionState::Open,
                    "parties.name": party.as_str(),
                    "tally.has_voted": { "$ne": voter.as_str() },
                },
                update: doc! {
                    "$inc": { "parties.$[party].vote_count": 1_i64, "revision": 1_i64 },
                    "$push": { "tally.has_voted": voter.as_str() },
                },
                array_filters: Some(vec![doc! { "party.name": party.as_str() }]),
            },
            Command::End => Self {
                filter: doc! {
                    "_id": election_id.as_str(),
                    "state": ElectionState::Open,
                },
                update: doc! {
                    "$set": { "state": ElectionState::Closed },
                    "$inc": { "revision": 1_i64 },
                },
                array_filters: None,
            },
        }
    }
}

/// A durable store keeping one document per election.
///
/// Each command is one atomic update whose filter encodes every rule the
/// command must satisfy, and which bumps the revision in the same write. When
/// nothing matches, the election is re-read and the state machine names the
/// broken rule.
#[derive(Clone)]
pub struct MongoStore {
    elections: Coll<Election>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            elections: Coll::from_db(db),
        }
    }

    /// Run the conditional update for `command`, returning the new revision,
    /// or `None` if the command does not currently apply.
    async fn try_commit(
        &self,
        election_id: &ElectionId,
        command: &Command,
    ) -> Result<Option<Revision>> {
        let ConditionalUpdate {
            filter,
            update,
            array_filters,
        } = ConditionalUpdate::for_command(election_id, command);
        let options = FindOneAndUpdateOptions::builder()
            .array_filters(array_filters)
            .projection(doc! { "revision": 1 })
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .elections
            .clone_with_type::<Document>()
            .find_one_and_update(filter, update, options)
            .await?;
        match updated {
            Some(election) => {
                let revision = election.get_i64("revision").map_err(|e| {
                    Error::Storage(format!("Election {election_id} has a malformed revision: {e}"))
                })?;
                Ok(Some(revision as Revision))
            }
            None => Ok(None),
        }
    }
}

#[rocket::async_trait]
impl LedgerStore for MongoStore {
    async fn insert(&self, election: Election) -> Result<()> {
        match self.elections.insert_one(&election, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::DuplicateElection(election.id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply(&self, election_id: &ElectionId, command: Command) -> Result<Revision> {
        let mut last_seen = None;
        loop {
            if let Some(revision) = self.try_commit(election_id, &command).await? {
                return Ok(revision);
            }
            // Nothing matched: find out which rule the command breaks.
            let mut election = self.snapshot(election_id).await?;
            let seen = election.revision;
            election.apply(command.clone())?;
            // The only rule that can start holding again is a missing party
            // that was registered in the meantime, which moves the revision.
            if last_seen == Some(seen) {
                return Err(Error::Storage(format!(
                    "Election {election_id} rejected a {:?} command the stored state allows",
                    command.action()
                )));
            }
            last_seen = Some(seen);
            debug!(
                "Election {election_id} changed under a {:?} command, retrying",
                command.action()
            );
        }
    }

    async fn snapshot(&self, election_id: &ElectionId) -> Result<Election> {
        self.elections
            .find_one(doc! { "_id": election_id.as_str() }, None)
            .await?
            .ok_or_else(|| Error::ElectionNotFound(election_id.clone()))
    }

    async fn summaries(&self, active: Option<bool>) -> Result<Vec<ElectionSummary>> {
        let filter = match active {
            Some(true) => doc! { "state": ElectionState::Open },
            Some(false) => doc! { "state": ElectionState::Closed },
            None => doc! {},
        };
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let summaries = self
            .elections
            .find(filter, options)
            .await?
            .map_ok(|election| election.summary())
            .try_collect()
            .await?;
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use rocket::tokio;

    use crate::model::{
        common::{
            election::{ElectionName, PartyName},
            identity::Identity,
        },
        ledger::{ElectionLedger, Party},
    };

    use super::*;

    #[backend_test(mongo)]
    async fn election_round_trips_through_db(db: Database) {
        let store = MongoStore::new(&db);
        let mut election = Election::example();
        let alice = PartyName::try_from("Alice").unwrap();
        election.apply(Command::AddParty(alice.clone())).unwrap();
        election
            .apply(Command::Vote {
                party: alice.clone(),
                voter: Identity::voter(1),
            })
            .unwrap();
        store.insert(election.clone()).await.unwrap();

        let stored = store.snapshot(&election.id).await.unwrap();
        // BSON datetimes only keep milliseconds.
        assert_eq!(
            stored.created_at.timestamp_millis(),
            election.created_at.timestamp_millis()
        );
        assert_eq!(
            stored.parties.iter().cloned().collect::<Vec<_>>(),
            vec![Party {
                name: alice,
                vote_count: 1
            }]
        );
        assert!(stored.tally.has_voted(&Identity::voter(1)));
        assert_eq!(stored.revision, 3);
    }

    #[backend_test(mongo)]
    async fn duplicate_ids_rejected_by_index(db: Database) {
        let store = MongoStore::new(&db);
        store.insert(Election::example()).await.unwrap();
        let err = store.insert(Election::example()).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateElection(_)));
    }

    #[backend_test(mongo)]
    async fn concurrent_votes_commit_once_each(ledger: ElectionLedger) {
        let e1 = ElectionId::try_from("E1").unwrap();
        let admin = Identity::admin();
        let alice = PartyName::try_from("Alice").unwrap();
        ledger
            .create_election(
                e1.clone(),
                ElectionName::try_from("Race").unwrap(),
                admin.clone(),
            )
            .await
            .unwrap();
        ledger.add_party(&e1, alice.clone(), admin).await.unwrap();

        // Eight distinct voters plus eight repeats of voter 0.
        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let ledger = ledger.clone();
                let e1 = e1.clone();
                let alice = alice.clone();
                let voter = if n < 8 { n } else { 0 };
                tokio::spawn(async move { ledger.vote(&e1, alice, Identity::voter(voter)).await })
            })
            .collect();
        let mut successes = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::DuplicateVote { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // Every distinct voter gets in, however the writes interleave.
        assert_eq!(successes, 8);
        let results = ledger.results(&e1).await.unwrap();
        assert_eq!(results.results, vec![8]);
        let summary = &ledger.elections(None).await.unwrap()[0];
        assert_eq!(summary.turnout, 8);
    }

    #[backend_test(mongo)]
    async fn rejections_name_the_broken_rule(ledger: ElectionLedger) {
        let e1 = ElectionId::try_from("E1").unwrap();
        let admin = Identity::admin();
        let alice = PartyName::try_from("Alice").unwrap();
        let bob = PartyName::try_from("Bob").unwrap();
        ledger
            .create_election(
                e1.clone(),
                ElectionName::try_from("Race").unwrap(),
                admin.clone(),
            )
            .await
            .unwrap();
        ledger.add_party(&e1, alice.clone(), admin.clone()).await.unwrap();

        let err = ledger
            .add_party(&e1, alice.clone(), admin.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateParty { .. }));
        let err = ledger
            .vote(&e1, bob.clone(), Identity::voter(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PartyNotFound { .. }));
        let receipt = ledger
            .vote(&e1, alice.clone(), Identity::voter(1))
            .await
            .unwrap();
        assert_eq!(receipt.revision, 3);
        let err = ledger
            .vote(&e1, alice.clone(), Identity::voter(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateVote { .. }));

        let receipt = ledger.end_election(&e1, admin.clone()).await.unwrap();
        assert_eq!(receipt.revision, 4);
        let err = ledger.end_election(&e1, admin.clone()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyClosed(_)));
        // Closed wins over an unknown party.
        let err = ledger
            .vote(&e1, bob.clone(), Identity::voter(2))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ElectionClosed(_)));
        let err = ledger.add_party(&e1, bob, admin).await.unwrap_err();
        assert!(matches!(err, Error::ElectionClosed(_)));
        let err = ledger
            .vote(&ElectionId::try_from("Ghost").unwrap(), alice, Identity::voter(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ElectionNotFound(_)));

        // The stored document agrees with the committed revisions.
        let results = ledger.results(&e1).await.unwrap();
        assert_eq!(results.results, vec![1]);
    }

    #[backend_test(mongo)]
    async fn listing_filters_by_state(ledger: ElectionLedger) {
        let admin = Identity::admin();
        for e in ["x", "y"] {
            ledger
                .create_election(
                    ElectionId::try_from(e).unwrap(),
                    ElectionName::try_from(e).unwrap(),
                    admin.clone(),
                )
                .await
                .unwrap();
        }
        ledger
            .end_election(&ElectionId::try_from("y").unwrap(), admin)
            .await
            .unwrap();

        assert_eq!(ledger.elections(None).await.unwrap().len(), 2);
        let open = ledger.elections(Some(true)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].election_id.as_str(), "x");
    }
}
