//! Error plumbing between infrastructure libraries and the engine taxonomy

mod conversions;

pub use conversions::InfraError;
