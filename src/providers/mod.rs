//! Default implementations of [crate::provider::Provider]

pub mod blocking;
pub mod suspendable;
