//! Depth-first traversal of a drive folder tree
//!
//! Entries are visited in listing order. A folder is expanded completely
//! before it is itself handed to the visitor, so a folder always comes right
//! after its own contents. Every page of a folder (recursion included) is
//! processed before the next page is requested.

use anyhow::{Context, Result};
use log::{debug, info};

use super::report::TransferStats;
use crate::models::{FileId, FileNode};
use crate::remote::DriveApi;

/// Traversal errors callers may want to match on
#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    #[error("Folder {folder} is nested deeper than the limit of {limit} levels")]
    DepthExceeded { folder: FileId, limit: usize },
}

/// Walks a folder tree through `DriveApi` listings
pub struct TreeWalker<'a> {
    api: &'a dyn DriveApi,
    max_depth: usize,
    stats: TransferStats,
}

impl<'a> TreeWalker<'a> {
    pub fn new(api: &'a dyn DriveApi, max_depth: usize) -> Self {
        Self {
            api,
            max_depth,
            stats: TransferStats::default(),
        }
    }

    /// Listing counters gathered so far (folders, pages, nodes)
    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    /// Visit every entry below `folder_id`
    ///
    /// When `folder_name` is `None` the name is fetched once for logging.
    /// The first listing failure aborts the whole walk.
    pub fn walk<F>(&mut self, folder_id: &FileId, folder_name: Option<&str>, visit: &mut F) -> Result<()>
    where
        F: FnMut(&FileNode) -> Result<()>,
    {
        self.walk_folder(folder_id, folder_name, 0, visit)
    }

    fn walk_folder<F>(
        &mut self,
        folder_id: &FileId,
        folder_name: Option<&str>,
        depth: usize,
        visit: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&FileNode) -> Result<()>,
    {
        if depth > self.max_depth {
            return Err(TraversalError::DepthExceeded {
                folder: folder_id.clone(),
                limit: self.max_depth,
            }
            .into());
        }

        let name = match folder_name {
            Some(name) => name.to_string(),
            None => self
                .api
                .file_name(folder_id)
                .with_context(|| format!("Failed to look up folder {}", folder_id))?,
        };
        info!("Gathering files in folder '{}'…", name);
        self.stats.folders_listed += 1;

        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .api
                .list_children(folder_id, page_token.as_deref())
                .with_context(|| format!("Failed to list folder '{}' ({})", name, folder_id))?;
            self.stats.pages_listed += 1;
            debug!("Listed {} entries in '{}'", page.nodes.len(), name);

            for node in &page.nodes {
                self.stats.nodes_seen += 1;
                if node.is_folder {
                    self.walk_folder(&node.id, Some(&node.name), depth + 1, visit)?;
                }
                visit(node)?;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(())
    }
}
