mod engine;
mod types;

pub use engine::reconcile;
pub use types::{ReconcileAction, ReconcileDiff, ReconcileReport};
