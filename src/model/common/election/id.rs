use std::fmt::{Display, Formatter};

use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of an election ID, in characters.
pub const MAX_ELECTION_ID_LEN: usize = 64;

/// A caller-supplied election identifier.
///
/// IDs appear in URL paths, so they are restricted to ASCII alphanumerics
/// and `-`, `_`, `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawElectionId", into = "String")]
pub struct ElectionId(String);

impl ElectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An election ID as it arrives over the wire: clients may send either a
/// string or a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawElectionId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawElectionId> for ElectionId {
    type Error = Error;

    fn try_from(raw: RawElectionId) -> Result<Self> {
        match raw {
            RawElectionId::Number(n) => Ok(Self(n.to_string())),
            RawElectionId::Text(s) => s.try_into(),
        }
    }
}

impl TryFrom<String> for ElectionId {
    type Error = Error;

    fn try_from(id: String) -> Result<Self> {
        if id.is_empty() {
            return Err(Error::InvalidInput("Election ID must not be empty".to_string()));
        }
        if id.chars().count() > MAX_ELECTION_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "Election ID must be at most {MAX_ELECTION_ID_LEN} characters"
            )));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(Error::InvalidInput(format!(
                "Election ID contains illegal character {c:?}"
            )));
        }
        Ok(Self(id))
    }
}

impl TryFrom<&str> for ElectionId {
    type Error = Error;

    fn try_from(id: &str) -> Result<Self> {
        id.to_string().try_into()
    }
}

impl From<ElectionId> for String {
    fn from(id: ElectionId) -> Self {
        id.0
    }
}

impl Display for ElectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'a> FromParam<'a> for ElectionId {
    type Error = Error;

    fn from_param(param: &'a str) -> Result<Self> {
        param.try_into()
    }
}
