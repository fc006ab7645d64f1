//! Domain layer: wire-level data model, blocking reasons and the ports the
//! gate talks to.

pub mod blocking;
pub mod cashier;
pub mod client;
pub mod location;
pub mod ports;
pub mod status;
