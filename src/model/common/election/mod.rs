mod id;
mod name;
mod state;

pub use id::{ElectionId, RawElectionId, MAX_ELECTION_ID_LEN};
pub use name::{ElectionName, PartyName, MAX_NAME_LEN};
pub use state::ElectionState;

/// Vote counts are unbounded apart from the number of distinct identities.
pub type VoteCount = u64;

/// Each committed command bumps an election's revision by one.
pub type Revision = u64;
