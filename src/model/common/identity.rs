use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of an identity, in characters.
pub const MAX_IDENTITY_LEN: usize = 256;

/// An opaque caller identity (an account address or principal).
///
/// The ledger only compares identities; resolving who the caller is happens
/// before a command reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(identity: String) -> Result<Self> {
        if identity.is_empty() {
            return Err(Error::InvalidInput("Identity must not be empty".to_string()));
        }
        if identity.chars().count() > MAX_IDENTITY_LEN {
            return Err(Error::InvalidInput(format!(
                "Identity must be at most {MAX_IDENTITY_LEN} characters"
            )));
        }
        if identity
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(Error::InvalidInput(
                "Identity must not contain whitespace or control characters".to_string(),
            ));
        }
        Ok(Self(identity))
    }
}

impl TryFrom<&str> for Identity {
    type Error = Error;

    fn try_from(identity: &str) -> Result<Self> {
        identity.to_string().try_into()
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Identity {
        pub fn admin() -> Self {
            Self("0xAdmin".to_string())
        }

        pub fn voter(n: usize) -> Self {
            Self(format!("0xVoter{n}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identity() {
        assert_eq!(
            Identity::try_from("0x59b670e9fA9D0A427751Af201D676719a970857b")
                .unwrap()
                .as_str(),
            "0x59b670e9fA9D0A427751Af201D676719a970857b"
        );
        assert!(Identity::try_from("").is_err());
        assert!(Identity::try_from("two words").is_err());
    }
}
