//! Outbound message handling.

pub mod delivery;

pub use delivery::{delivery_loop, DeliveryStats, Outbox};
