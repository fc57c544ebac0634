//! Google Drive API integration
//!
//! This module provides:
//! - OAuth2 authentication flow
//! - Drive v3 client implementing `DriveApi`
//! - multipart/mixed batch encoding and decoding
//! - Response normalization to domain models

mod auth;
mod batch;
mod client;
mod normalize;

pub use auth::{AuthOptions, DriveAuth};
pub use batch::{BatchItemResponse, BatchPart, decode_batch_response, encode_batch_request};
pub use client::DriveClient;
pub use normalize::normalize_file;

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Drive API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from files.list
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileList {
        #[serde(default)]
        pub files: Vec<DriveFile>,
        pub next_page_token: Option<String>,
    }

    /// File resource, restricted to the fields the traversal requests
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DriveFile {
        pub id: String,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub mime_type: String,
        /// Absent for items in shared drives
        pub owners: Option<Vec<Owner>>,
    }

    /// Owner entry of a file
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Owner {
        /// True when this owner is the authenticated user
        #[serde(default)]
        pub me: bool,
        pub email_address: Option<String>,
    }

    /// Response from files.get?fields=name
    #[derive(Debug, Deserialize)]
    pub struct FileName {
        pub name: String,
    }

    /// Body of permissions.create for an ownership transfer
    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NewPermission<'a> {
        #[serde(rename = "type")]
        pub kind: &'a str,
        pub role: &'a str,
        pub email_address: &'a str,
    }

    /// Permission resource returned by permissions.create
    #[derive(Debug, Deserialize)]
    pub struct Permission {
        pub id: String,
        #[serde(default)]
        pub role: String,
    }
}
