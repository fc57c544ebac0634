//! Convert Drive API responses to domain models

use super::FOLDER_MIME_TYPE;
use super::api::DriveFile;
use crate::models::{FileId, FileNode};

/// Convert a listed Drive file to a `FileNode`
///
/// The caller owns the file only if it is the *first* listed owner.
pub fn normalize_file(file: DriveFile) -> FileNode {
    let is_owned_by_caller = file
        .owners
        .as_ref()
        .and_then(|owners| owners.first())
        .is_some_and(|owner| owner.me);

    FileNode {
        id: FileId::new(file.id),
        name: file.name,
        is_folder: file.mime_type == FOLDER_MIME_TYPE,
        is_owned_by_caller,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::api::FileList;

    #[test]
    fn test_normalize_listing() {
        let json = r#"{
            "nextPageToken": "tok-2",
            "files": [
                {
                    "id": "folder-1",
                    "name": "Projects",
                    "mimeType": "application/vnd.google-apps.folder",
                    "owners": [{"me": true, "emailAddress": "me@example.com"}]
                },
                {
                    "id": "doc-1",
                    "name": "Shared with me",
                    "mimeType": "application/vnd.google-apps.document",
                    "owners": [
                        {"me": false, "emailAddress": "other@example.com"},
                        {"me": true, "emailAddress": "me@example.com"}
                    ]
                },
                {
                    "id": "drive-item",
                    "name": "Team file",
                    "mimeType": "text/plain"
                }
            ]
        }"#;

        let list: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(list.next_page_token.as_deref(), Some("tok-2"));

        let nodes: Vec<FileNode> = list.files.into_iter().map(normalize_file).collect();
        assert!(nodes[0].is_folder);
        assert!(nodes[0].is_owned_by_caller);
        assert!(!nodes[1].is_folder);
        assert!(!nodes[1].is_owned_by_caller);
        assert!(!nodes[2].is_owned_by_caller);
        assert_eq!(nodes[2].id.as_str(), "drive-item");
    }

    #[test]
    fn test_empty_listing() {
        let list: FileList = serde_json::from_str("{}").unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }
}
