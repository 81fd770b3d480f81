//! API-compatible types.
//!
//! Request and response bodies use camelCase keys. Every successful response
//! carries `"success": true` next to its payload.

mod caller;
mod request;
mod response;

pub use caller::{Caller, Voter, IDENTITY_HEADER};
pub use request::{AddPartyRequest, CreateElectionRequest, EndElectionRequest, VoteRequest};
pub use response::{Committed, ElectionList, Success};
