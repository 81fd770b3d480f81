use chrono::{DateTime, SecondsFormat, Utc};
use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::model::common::{
    election::{ElectionId, Revision},
    identity::Identity,
};

pub type HmacSha256 = Hmac<Sha256>;

/// The kind of command a receipt acknowledges.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    CreateElection,
    AddParty,
    Vote,
    EndElection,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::CreateElection => "createElection",
            Self::AddParty => "addParty",
            Self::Vote => "vote",
            Self::EndElection => "endElection",
        }
    }
}

/// Acknowledgement of a committed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub election_id: ElectionId,
    pub action: Action,
    pub actor: Identity,
    /// The election's revision after this command: its position in the
    /// election's commit order.
    pub revision: Revision,
    pub committed_at: DateTime<Utc>,
    /// Hex HMAC-SHA256 over all of the above.
    pub signature: String,
}

/// Signs and verifies receipts with a server-side secret.
#[derive(Clone)]
pub struct ReceiptSigner {
    key: Vec<u8>,
}

impl ReceiptSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Produce a signed receipt.
    pub fn sign(
        &self,
        election_id: ElectionId,
        action: Action,
        actor: Identity,
        revision: Revision,
        committed_at: DateTime<Utc>,
    ) -> Receipt {
        let mut receipt = Receipt {
            election_id,
            action,
            actor,
            revision,
            committed_at,
            signature: String::new(),
        };
        let mac = self.mac(&receipt);
        receipt.signature = HEXLOWER.encode(&mac.finalize().into_bytes());
        receipt
    }

    /// Check that a receipt was issued under this signer's key and has not
    /// been altered.
    pub fn verify(&self, receipt: &Receipt) -> bool {
        let signature = match HEXLOWER.decode(receipt.signature.as_bytes()) {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        self.mac(receipt).verify_slice(&signature).is_ok()
    }

    fn mac(&self, receipt: &Receipt) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        let committed_at = receipt
            .committed_at
            .to_rfc3339_opts(SecondsFormat::Nanos, true);
        let revision = receipt.revision.to_string();
        // Length-prefix each field so no two receipts share an encoding.
        for field in [
            receipt.election_id.as_str(),
            receipt.action.as_str(),
            receipt.actor.as_str(),
            revision.as_str(),
            committed_at.as_str(),
        ] {
            mac.update(&(field.len() as u64).to_le_bytes());
            mac.update(field.as_bytes());
        }
        mac
    }
}
