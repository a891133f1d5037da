//! Client-side credential storage and validation
//!
//! [`TokenProvider`] looks up the bearer token in a fixed backend order
//! (durable file, session memory, cookie jar) and purges every backend when
//! the token it finds is invalid or expired.

mod provider;
mod store;
mod token;

pub use provider::TokenProvider;
pub use store::{CookieTokenStore, FileTokenStore, MemoryTokenStore, TokenBackend, TokenStore};
pub use token::AuthToken;
