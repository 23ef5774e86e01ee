//! Gateway abstractions: the outbound port and the types that cross it.

pub mod port;
pub mod types;
