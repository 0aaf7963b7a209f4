//! Remote API client for the simulator.
//!
//! Speaks the simulator's ZMQ remote API: CBOR-encoded function calls over
//! a REQ socket, one reply per request.

pub mod client;
pub mod protocol;

pub use client::{init_simulation, RemoteApiClient, DEFAULT_PORT};
