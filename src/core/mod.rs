//! # Core Data Model
//!
//! The typed tree that both the text and binary forms decode into.
//!
//! ## Components
//! - **Node**: containers, atoms, symbols, variables, defines and directives
//! - **Types**: the 32-bit type tags used by the binary form
//! - **Render**: canonical DTA text for any node
//!
//! ## Node Kinds
//! ```text
//! (a b)  {a b}  [a b]      containers
//! 42  1.5  "text"          atoms
//! name  'two words'        symbols
//! $var                     variables
//! #define NAME (body)      defines
//! #ifdef NAME ... #endif   directives
//! ```

pub mod node;
pub mod render;
pub mod types;

pub use node::{ArrayKind, Atom, DataArray, Define, Directive, Node};
pub use types::DataType;
