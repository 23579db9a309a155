//! Tower middleware applied in front of the proxy pipeline

pub mod correlation;

pub use correlation::CorrelationIdLayer;
