// src/state/mod.rs

//! Durable execution state kept in the host's shared key-value store.
//!
//! - [`record`] defines the identity token and the JSON record shape.
//! - [`store`] owns identity assignment and the read-modify-write protocol.

pub mod record;
pub mod store;

pub use record::{ExecutionIdentity, ExecutionStateRecord};
pub use store::ExecutionStateStore;
