//! # Utility Modules
//!
//! Supporting pieces shared by the binary codec and applications.
//!
//! ## Components
//! - **Crypto**: XOR key-stream adapter for encrypted DTB streams
//! - **Logging**: console subscriber setup from configuration

pub mod crypto;
pub mod logging;

pub use crypto::CryptStream;
