use log::{debug, error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::{Status, StatusClass},
    response::{self, status, Responder},
    serde::json::{self, Json},
    Request,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::common::{
    election::{ElectionId, PartyName},
    identity::Identity,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Election {0} not found")]
    ElectionNotFound(ElectionId),
    #[error("Election {0} already exists")]
    DuplicateElection(ElectionId),
    #[error("Election {0} is closed")]
    ElectionClosed(ElectionId),
    #[error("Election {0} has already been closed")]
    AlreadyClosed(ElectionId),
    #[error("Party '{party}' is already registered in election {election}")]
    DuplicateParty {
        election: ElectionId,
        party: PartyName,
    },
    #[error("Party '{party}' not found in election {election}")]
    PartyNotFound {
        election: ElectionId,
        party: PartyName,
    },
    #[error("{voter} has already voted in election {election}")]
    DuplicateVote {
        election: ElectionId,
        voter: Identity,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} is not an administrator")]
    Unauthorized(Identity),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl Error {
    /// Machine-readable name of this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElectionNotFound(_) => "ElectionNotFound",
            Self::DuplicateElection(_) => "DuplicateElection",
            Self::ElectionClosed(_) => "ElectionClosed",
            Self::AlreadyClosed(_) => "AlreadyClosed",
            Self::DuplicateParty { .. } => "DuplicateParty",
            Self::PartyNotFound { .. } => "PartyNotFound",
            Self::DuplicateVote { .. } => "DuplicateVote",
            Self::InvalidInput(_) => "InvalidInput",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Db(_) | Self::Storage(_) => "StorageUnavailable",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::ElectionNotFound(_) | Self::PartyNotFound { .. } => Status::NotFound,
            Self::DuplicateElection(_)
            | Self::DuplicateParty { .. }
            | Self::DuplicateVote { .. }
            | Self::ElectionClosed(_)
            | Self::AlreadyClosed(_) => Status::Conflict,
            Self::InvalidInput(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Forbidden,
            Self::Db(_) | Self::Storage(_) => Status::InternalServerError,
        }
    }

    /// Infrastructure failures, as opposed to business-rule rejections.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Storage(_))
    }
}

impl From<json::Error<'_>> for Error {
    fn from(err: json::Error<'_>) -> Self {
        match err {
            json::Error::Io(e) => Self::InvalidInput(format!("Could not read request body: {e}")),
            json::Error::Parse(_, e) => Self::InvalidInput(format!("Malformed request body: {e}")),
        }
    }
}

/// JSON body of every failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub kind: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            kind: kind.into(),
        }
    }
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        // Don't leak driver internals to clients.
        let message = if err.is_fatal() {
            "Storage unavailable".to_string()
        } else {
            err.to_string()
        };
        Self::new(message, err.kind())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        match status.class() {
            StatusClass::ServerError => error!("{} {}: {self}", req.method(), req.uri()),
            _ if matches!(self, Self::Unauthorized(_)) => {
                warn!("{} {}: {self}", req.method(), req.uri())
            }
            _ => debug!("{} {}: {self}", req.method(), req.uri()),
        }
        status::Custom(status, Json(ErrorBody::from(&self))).respond_to(req)
    }
}
