//! Reverie Server
//!
//! HTTP API and command-line front ends over the `reverie-core` relationship
//! engine. Exposes the router for the server binary and the shared engine
//! setup used by both binaries.

pub mod api;
pub mod engine;
