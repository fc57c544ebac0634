//! Drive API HTTP client
//!
//! Implements `DriveApi` on top of the Drive v3 REST endpoints.
//! Uses synchronous HTTP (ureq).

use anyhow::{Context, Result};
use log::debug;
use url::Url;

use super::api::{FileList, FileName, NewPermission, Permission};
use super::batch::{BatchItemResponse, BatchPart, decode_batch_response, encode_batch_request};
use super::{DriveAuth, normalize_file};
use crate::models::{FileId, TransferRequest};
use crate::remote::{ChildrenPage, DriveApi, ItemError, ItemOutcome, PermissionGrant};

/// Drive API client
pub struct DriveClient {
    auth: DriveAuth,
}

impl DriveClient {
    /// Drive API base URL
    const BASE_URL: &'static str = "https://www.googleapis.com/drive/v3";

    /// Batch endpoint for the Drive API
    const BATCH_URL: &'static str = "https://www.googleapis.com/batch/drive/v3";

    /// Fields requested per listed file
    const LIST_FIELDS: &'static str = "files(id, name, mimeType, owners(me, emailAddress)), nextPageToken";

    /// Largest page the listing endpoint serves
    const PAGE_SIZE: &'static str = "1000";

    pub fn new(auth: DriveAuth) -> Self {
        Self { auth }
    }

    /// Trigger authentication up front
    pub fn authenticate(&self) -> Result<()> {
        self.auth.get_access_token()?;
        Ok(())
    }

    fn bearer(&self) -> Result<String> {
        Ok(format!("Bearer {}", self.auth.get_access_token()?))
    }

    /// Query selecting the non-trashed children of `folder_id`
    fn children_query(folder_id: &FileId) -> String {
        let escaped = folder_id.as_str().replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{}' in parents and not trashed", escaped)
    }

    fn list_url(folder_id: &FileId, page_token: Option<&str>) -> Result<Url> {
        let query = Self::children_query(folder_id);
        let mut params = vec![
            ("q", query.as_str()),
            ("fields", Self::LIST_FIELDS),
            ("pageSize", Self::PAGE_SIZE),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        Url::parse_with_params(&format!("{}/files", Self::BASE_URL), &params)
            .context("Failed to build list URL")
    }

    /// Batch part creating an owner permission for `request`
    fn permission_part(request: &TransferRequest) -> Result<BatchPart> {
        let body = serde_json::to_string(&NewPermission {
            kind: "user",
            role: "owner",
            email_address: &request.new_owner,
        })?;

        // Drive refuses sendNotificationEmail=false for ownership transfers
        Ok(BatchPart {
            method: "POST",
            path: format!(
                "/drive/v3/files/{}/permissions?transferOwnership=true&sendNotificationEmail=true",
                urlencoding::encode(request.file_id.as_str())
            ),
            body: Some(body),
        })
    }

    fn item_outcome(status: u16, body: &str) -> ItemOutcome {
        if !(200..300).contains(&status) {
            return Err(ItemError::from_response(status, body));
        }
        match serde_json::from_str::<Permission>(body) {
            Ok(permission) => Ok(PermissionGrant {
                permission_id: permission.id,
                role: permission.role,
            }),
            Err(e) => {
                debug!("Unparseable permission in successful response: {}", e);
                Ok(PermissionGrant {
                    permission_id: String::new(),
                    role: "owner".to_string(),
                })
            }
        }
    }

    /// Place decoded parts at their request positions
    ///
    /// Parts pointing past the batch are ignored; requests without a part
    /// fail with a transport error.
    fn outcomes_from_parts(len: usize, parts: Vec<BatchItemResponse>) -> Vec<ItemOutcome> {
        let mut outcomes: Vec<Option<ItemOutcome>> = vec![None; len];
        for part in parts {
            match outcomes.get_mut(part.index) {
                Some(slot) => *slot = Some(Self::item_outcome(part.status, &part.body)),
                None => debug!("Ignoring batch part for unknown item {}", part.index),
            }
        }

        outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| Err(ItemError::transport("No response for item in batch")))
            })
            .collect()
    }
}

impl DriveApi for DriveClient {
    fn list_children(&self, folder_id: &FileId, page_token: Option<&str>) -> Result<ChildrenPage> {
        let url = Self::list_url(folder_id, page_token)?;

        let mut response = ureq::get(url.as_str())
            .header("Authorization", &self.bearer()?)
            .call()
            .with_context(|| format!("Failed to list children of folder {}", folder_id))?;

        let list: FileList = response
            .body_mut()
            .read_json()
            .context("Failed to parse file list response")?;

        Ok(ChildrenPage {
            nodes: list.files.into_iter().map(normalize_file).collect(),
            next_page_token: list.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    fn file_name(&self, file_id: &FileId) -> Result<String> {
        let url = format!(
            "{}/files/{}?fields=name",
            Self::BASE_URL,
            urlencoding::encode(file_id.as_str())
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &self.bearer()?)
            .call()
            .with_context(|| format!("Failed to fetch metadata of {}", file_id))?;

        let file: FileName = response
            .body_mut()
            .read_json()
            .context("Failed to parse file metadata response")?;

        Ok(file.name)
    }

    fn transfer_ownership_batch(&self, requests: &[TransferRequest]) -> Result<Vec<ItemOutcome>> {
        let parts = requests
            .iter()
            .map(Self::permission_part)
            .collect::<Result<Vec<_>>>()?;

        let boundary = format!(
            "drive_owner_batch_{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let body = encode_batch_request(&boundary, &parts);

        let mut response = ureq::post(Self::BATCH_URL)
            .header("Authorization", &self.bearer()?)
            .header("Content-Type", &format!("multipart/mixed; boundary={}", boundary))
            .send(body)
            .context("Failed to send batch request")?;

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read batch response")?;

        let items = decode_batch_response(&content_type, &text)?;
        Ok(Self::outcomes_from_parts(requests.len(), items))
    }
}
