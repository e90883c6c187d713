mod engine;
mod types;

pub use engine::RiskEngine;
pub use types::{RejectionCode, RiskConfig, RiskDecision, RiskSnapshot};
