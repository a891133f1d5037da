//! # Courier Domain
//!
//! Data types shared by the request engine and the offline queue.
//!
//! This crate contains:
//! - Request, response and queue record types
//! - The engine error taxonomy (`EngineError`)
//! - Engine configuration (`EngineConfig`)
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Courier crates
//! - Only external dependencies allowed
//! - Pure data types, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
