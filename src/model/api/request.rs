use serde::{Deserialize, Serialize};

use crate::model::common::election::{ElectionId, ElectionName, PartyName};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElectionRequest {
    pub election_id: ElectionId,
    pub name: ElectionName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPartyRequest {
    pub election_id: ElectionId,
    pub party_name: PartyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub election_id: ElectionId,
    pub party_name: PartyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndElectionRequest {
    pub election_id: ElectionId,
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;

    #[test]
    fn numeric_election_id() {
        let request: CreateElectionRequest =
            serde_json::from_value(json!({"electionId": 42, "name": "Race"})).unwrap();
        assert_eq!(request.election_id.as_str(), "42");
    }

    #[test]
    fn invalid_fields_are_rejected() {
        for body in [
            json!({"electionId": "E1", "partyName": ""}),
            json!({"electionId": "E 1", "partyName": "Alice"}),
            json!({"electionId": -1, "partyName": "Alice"}),
            json!({"electionId": "E1"}),
        ] {
            assert!(serde_json::from_value::<VoteRequest>(body).is_err());
        }
    }
}
