//! Session presence tracking for the wardboard operations dashboard.
//!
//! Many independent clients register themselves as logged in against a
//! shared store, keep their rows fresh with heartbeats, and are reclaimed
//! opportunistically when they go away without saying goodbye. Termination
//! always writes an audit record before the row disappears.
//!
//! Client hosts embed [`services::registry::SessionRegistry`]; the
//! `wardboard-presence` binary serves the administrative view (live list,
//! terminate, sweep, audit trail) over HTTP.

pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod presence;
pub mod services;
pub mod state;
pub mod store;
pub mod types;
