use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the Election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionState {
    /// Accepting parties and votes.
    Open,
    /// Terminal: the tally is frozen, but still readable by all.
    Closed,
}

impl ElectionState {
    pub fn is_active(self) -> bool {
        self == Self::Open
    }
}

impl From<ElectionState> for Bson {
    fn from(state: ElectionState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}
