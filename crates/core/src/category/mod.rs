//! Category tree rules.
//!
//! Categories form a parent/child hierarchy via `parent_id` edges. The
//! data model does not force a tree shape, so re-parenting is validated
//! at write time to keep the hierarchy acyclic.

pub mod tree;

pub use tree::{CategoryTreeError, validate_parent};
