//! Host-facing behaviour interface
//!
//! The host framework owns component instantiation and calls these hooks in
//! its own order; components only react.

pub mod system;

pub use system::{Behavior, ChangedFields};
