//! Application layer: the cashier gate and the sub-flows it drives.
//!
//! `SessionGate` owns one page activation. It evaluates the account status,
//! runs the verification and consent flows when the API asks for them, and
//! hands the provider URL to `CashierSession` for embedding.

pub mod consent;
pub mod evaluator;
pub mod gate;
pub mod router;
pub mod session;
pub mod verification;
