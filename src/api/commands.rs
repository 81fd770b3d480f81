use rocket::{
    serde::json::{self, Json},
    Route, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        AddPartyRequest, Caller, Committed, CreateElectionRequest, EndElectionRequest, Success,
        Voter, VoteRequest,
    },
    ledger::ElectionLedger,
};

pub fn routes() -> Vec<Route> {
    routes![create_election, add_party, vote, end_election]
}

/// A JSON body, or the reason it could not be parsed.
type Body<'r, T> = std::result::Result<Json<T>, json::Error<'r>>;

#[post("/createElection", data = "<request>")]
async fn create_election(
    caller: Result<Caller>,
    request: Body<'_, CreateElectionRequest>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<Committed>>> {
    let Caller(caller) = caller?;
    let request = request.map_err(Error::from)?.into_inner();
    let receipt = ledger
        .create_election(request.election_id, request.name, caller)
        .await?;
    Ok(Json(Success::new(Committed { receipt })))
}

#[post("/addParty", data = "<request>")]
async fn add_party(
    caller: Result<Caller>,
    request: Body<'_, AddPartyRequest>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<Committed>>> {
    let Caller(caller) = caller?;
    let request = request.map_err(Error::from)?.into_inner();
    let receipt = ledger
        .add_party(&request.election_id, request.party_name, caller)
        .await?;
    Ok(Json(Success::new(Committed { receipt })))
}

#[post("/vote", data = "<request>")]
async fn vote(
    voter: Result<Voter>,
    request: Body<'_, VoteRequest>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<Committed>>> {
    let Voter(voter) = voter?;
    let request = request.map_err(Error::from)?.into_inner();
    let receipt = ledger
        .vote(&request.election_id, request.party_name, voter)
        .await?;
    Ok(Json(Success::new(Committed { receipt })))
}

#[post("/endElection", data = "<request>")]
async fn end_election(
    caller: Result<Caller>,
    request: Body<'_, EndElectionRequest>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<Committed>>> {
    let Caller(caller) = caller?;
    let request = request.map_err(Error::from)?.into_inner();
    let receipt = ledger.end_election(&request.election_id, caller).await?;
    Ok(Json(Success::new(Committed { receipt })))
}
