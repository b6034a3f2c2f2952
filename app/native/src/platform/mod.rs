//! Platform helpers shared across modules.
//!
//! - [`path`] - `~` expansion and relative path resolution
//! - [`thread`] - named worker threads

pub mod path;
pub mod thread;

pub use path::{expand, expand_and_resolve};
pub use thread::spawn_named_thread;
