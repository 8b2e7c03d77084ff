//! Logging setup for binaries and tests that embed the service provider.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host unless it opts into [`init_tracing`].

mod tracing_init;

pub use tracing_init::*;
