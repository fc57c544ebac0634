//! Domain models for drive entries

mod node;
mod request;

pub use node::{FileId, FileNode};
pub use request::TransferRequest;
