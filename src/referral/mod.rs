//! Referral counting and reward cycles.

mod policy;
mod store;

pub use policy::{ProgressSnapshot, evaluate};
pub use store::CounterStore;
