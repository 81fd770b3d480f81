use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};

use crate::error::Error;
use crate::model::common::identity::Identity;
use crate::Config;

/// Header carrying the caller's identity.
pub const IDENTITY_HEADER: &str = "X-Identity";

/// Parse the identity header, if present.
fn header_identity(req: &Request<'_>) -> Option<Result<Identity, Error>> {
    req.headers()
        .get_one(IDENTITY_HEADER)
        .map(Identity::try_from)
}

/// The identity issuing an administrative command.
///
/// Taken from the `X-Identity` header, falling back to the configured
/// operator identity when the header is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Identity);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match header_identity(req) {
            Some(Ok(identity)) => Outcome::Success(Caller(identity)),
            Some(Err(e)) => Outcome::Error((Status::BadRequest, e)),
            None => {
                let operator = req
                    .rocket()
                    .state::<Config>()
                    .and_then(Config::operator_identity);
                match operator {
                    Some(identity) => Outcome::Success(Caller(identity.clone())),
                    None => Outcome::Error((
                        Status::BadRequest,
                        Error::InvalidInput(format!(
                            "Missing {IDENTITY_HEADER} header and no operator identity is configured"
                        )),
                    )),
                }
            }
        }
    }
}

/// The identity casting a vote. Always taken from the `X-Identity` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter(pub Identity);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Voter {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match header_identity(req) {
            Some(Ok(identity)) => Outcome::Success(Voter(identity)),
            Some(Err(e)) => Outcome::Error((Status::BadRequest, e)),
            None => Outcome::Error((
                Status::BadRequest,
                Error::InvalidInput(format!("Missing {IDENTITY_HEADER} header")),
            )),
        }
    }
}
