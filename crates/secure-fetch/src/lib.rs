//! Secure Fetch - HTTP client for crypto-session servers
//!
//! GET requests carry a token signing the full URL; POST bodies are
//! signed, encrypted and wrapped in a JSON envelope. Replies are verified
//! and decrypted before being handed back.

mod client;
mod error;
mod request;
mod response;
mod transport;

pub use client::*;
pub use error::*;
pub use request::*;
pub use response::*;
pub use transport::*;
