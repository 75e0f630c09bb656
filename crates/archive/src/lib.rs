//! Versioned archive identities and the planning logic built on them.
//!
//! Everything in this crate is synchronous and free of I/O:
//!
//! - [`ArchiveIdentity`] parses a filename stem into a logical name and a
//!   version token.
//! - [`ArchiveSet`] collects identities from local paths or a remote listing.
//! - [`reconcile`] decides which archives must be fetched.
//! - [`plan_retention`] decides which former local versions can be deleted.

pub mod error;
mod identity;
mod library;
mod reconcile;
mod retention;
mod set;

pub use crate::identity::{ArchiveIdentity, DELIMITER, Location, NameComponents, Version};
pub use crate::library::Library;
pub use crate::reconcile::{Reconciliation, Stale, reconcile};
pub use crate::retention::plan_retention;
pub use crate::set::ArchiveSet;

/// File extension of Kiwix archives, without the leading dot.
pub const DEFAULT_EXTENSION: &str = "zim";
