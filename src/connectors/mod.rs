//! Default implementations of [crate::backend::Connector] and
//! [crate::backend::BlockingConnector]

pub mod tcp;

#[cfg(feature = "diesel_pg")]
pub mod diesel_pg;
