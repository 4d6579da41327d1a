//! stepnav library exports for testing

pub mod core;
pub mod geo;
pub mod replay;
pub mod runtime;
pub mod services;

#[cfg(test)]
pub mod test_support;
