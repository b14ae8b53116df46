//! # void_core - Void Itemization Core
//!
//! Core primitives shared by every itemization crate:
//! - **Handles**: process-unique, never-recycled typed handles
//! - **Named ids**: string identifiers with a precomputed hash
//!
//! Everything here is plain data. Ownership of the records a handle points
//! at always lives elsewhere.

pub mod handle;
pub mod id;

pub use handle::*;
pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handle::{Handle, HandleAllocator};
    pub use crate::id::NamedId;
}
