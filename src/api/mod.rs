use rocket::{
    http::Status,
    response::status,
    serde::json::Json,
    Catcher, Request, Route,
};

use crate::error::ErrorBody;

mod commands;
mod queries;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(commands::routes());
    routes.extend(queries::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Answer anything no route handled (unknown paths, unparseable bodies) in
/// the same shape as a ledger error.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> status::Custom<Json<ErrorBody>> {
    let body = match status.code {
        404 => ErrorBody::new(format!("No route for {} {}", req.method(), req.uri()), "NotFound"),
        400 | 413 | 415 | 422 => ErrorBody::new(
            format!("Malformed request: {}", status.reason_lossy()),
            "InvalidInput",
        ),
        _ => ErrorBody::new(status.reason_lossy(), "HttpError"),
    };
    status::Custom(status, Json(body))
}
