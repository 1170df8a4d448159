//! Todo Vibe core: the local persistent todo store and the weather pipeline
//! (upstream client, normalizer, endpoint handlers, fetch orchestrator).

pub mod config;
pub mod errors;
pub mod routes;
pub mod services;
pub mod store;
