//! Request-path middleware state.

pub mod admission;
