//! Order coordinator (§4.7): the only crate that calls a `BrokerAdapter`.
//! `state_machine` models the trade lifecycle as explicit events over a
//! `TradeRecord`; `coordinator` composes that state machine with the broker,
//! position store, durable store, and circuit breaker into submit_buy,
//! submit_exit, and the postback fast-path.

mod coordinator;
mod state_machine;

pub use coordinator::OrderCoordinator;
pub use state_machine::{TradeEvent, TradeLifecycle, TransitionError};
