//! Remote drive abstraction
//!
//! The transfer engine only needs three things from the storage provider:
//! list one page of a folder's children, look up a folder's name, and submit
//! a batch of ownership grants. `DriveApi` captures exactly that, so the
//! Google client and the in-memory drive used by tests are interchangeable.

mod error;
mod memory;
mod traits;

pub use error::ItemError;
pub use memory::InMemoryDrive;
pub use traits::{ChildrenPage, DriveApi, ItemOutcome, PermissionGrant};
