use rocket::{form, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{ElectionList, Success},
    common::election::ElectionId,
    ledger::{ElectionDetails, ElectionLedger, ElectionResults},
};

pub fn routes() -> Vec<Route> {
    routes![get_results, get_election_details, elections]
}

#[get("/getResults/<election_id>")]
async fn get_results(
    election_id: Result<ElectionId>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<ElectionResults>>> {
    let results = ledger.results(&election_id?).await?;
    Ok(Json(Success::new(results)))
}

#[get("/getElectionDetails/<election_id>")]
async fn get_election_details(
    election_id: Result<ElectionId>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<ElectionDetails>>> {
    let details = ledger.details(&election_id?).await?;
    Ok(Json(Success::new(details)))
}

/// All elections ordered by ID, optionally only active (or only closed) ones.
#[get("/elections?<active>")]
async fn elections(
    active: Option<form::Result<'_, bool>>,
    ledger: &State<ElectionLedger>,
) -> Result<Json<Success<ElectionList>>> {
    let active = active
        .transpose()
        .map_err(|e| Error::InvalidInput(format!("Invalid `active` filter: {e}")))?;
    let elections = ledger.elections(active).await?;
    Ok(Json(Success::new(ElectionList { elections })))
}
