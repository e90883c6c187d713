//! Job registry + market calendar gate (§4.8). Owns the only other piece of
//! process-wide state besides the circuit breaker (§9): the job list itself.

mod calendar;
mod scheduler;

pub use calendar::{AlwaysOpenCalendar, MarketCalendar, NyseCalendar};
pub use scheduler::{Job, Scheduler};
