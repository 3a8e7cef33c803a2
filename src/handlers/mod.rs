// handlers/mod.rs - endpoint table
//
// Every handler has the same shape: (AppState, RequestContext, path args).
// Authentication is checked inside each handler through `state.guard`, so the
// table itself carries no access policy.

pub mod auth;
pub mod lookup;
pub mod patients;

use crate::app::{handler, Handler};
use crate::routing::{RoutePatternError, RouteTable};

pub fn routes(base_path: &str) -> Result<RouteTable<Handler>, RoutePatternError> {
    let mut table = RouteTable::with_base_path(base_path);

    // Authentication
    table.post("/auth/login", handler(auth::login))?;
    table.post("/auth/verify", handler(auth::verify))?;
    table.get("/auth/user", handler(auth::current_user))?;
    table.post("/auth/logout", handler(auth::logout))?;

    // Patients
    table.get("/patients", handler(patients::list))?;
    table.get("/patients/{id}", handler(patients::show))?;
    table.post("/patients", handler(patients::create))?;
    table.put("/patients/{id}", handler(patients::update))?;
    table.delete("/patients/{id}", handler(patients::delete))?;

    // Reference data
    table.get("/lookup/{type}", handler(lookup::lookup))?;

    Ok(table)
}
