//! Remote Tree Downloader
//!
//! Mirrors a directory of the hub repository onto local disk. Siblings are
//! fetched concurrently; every directory joins all of its children before it
//! completes, and the first failure cancels the rest of the tree.

use futures::future::{try_join_all, LocalBoxFuture};
use futures::FutureExt;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, warn};

use servehub_protocol::{ContentEntry, EntryKind, HubTransport};

use crate::common::{HubError, HubResult};

/// Totals for a finished download
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

impl AddAssign for DownloadSummary {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.directories += other.directories;
        self.bytes += other.bytes;
    }
}

pub struct TreeDownloader<'a, T> {
    transport: &'a T,
    permits: Semaphore,
}

impl<'a, T: HubTransport> TreeDownloader<'a, T> {
    /// `concurrency` bounds in-flight requests across the whole tree
    pub fn new(transport: &'a T, concurrency: usize) -> Self {
        Self {
            transport,
            permits: Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS)),
        }
    }

    /// Mirror `remote_path` into `local_path`.
    ///
    /// `local_path` is created once the remote directory has been listed.
    /// Files written before a failure are left in place.
    pub async fn download(&self, remote_path: &str, local_path: &Path) -> HubResult<DownloadSummary> {
        let remote = remote_path.trim_matches('/').to_string();
        info!("Downloading {} to {:?}", remote, local_path);

        let summary = self.mirror_dir(remote, local_path.to_path_buf()).await?;

        info!(
            "Downloaded {} files in {} directories ({} bytes)",
            summary.files, summary.directories, summary.bytes
        );
        Ok(summary)
    }

    fn mirror_dir(&self, remote: String, local: PathBuf) -> LocalBoxFuture<'_, HubResult<DownloadSummary>> {
        async move {
            let entries = {
                let _permit = self.acquire().await?;
                self.transport
                    .list_dir(&remote)
                    .await
                    .map_err(|e| HubError::download(e, &remote))?
            };
            debug!("Listed {}: {} entries", remote, entries.len());
            create_dir(&local).await?;

            let mut children = Vec::with_capacity(entries.len());
            for entry in entries {
                let target = local.join(checked_name(&entry, &remote)?);
                match entry.kind {
                    EntryKind::File => children.push(self.fetch_file(entry, target).boxed_local()),
                    EntryKind::Dir => children.push(self.mirror_subdir(entry, target)),
                    other => warn!("Skipping {} ({:?})", entry.path, other),
                }
            }

            let mut summary = DownloadSummary::default();
            for child in try_join_all(children).await? {
                summary += child;
            }
            Ok(summary)
        }
        .boxed_local()
    }

    fn mirror_subdir(
        &self,
        entry: ContentEntry,
        target: PathBuf,
    ) -> LocalBoxFuture<'_, HubResult<DownloadSummary>> {
        async move {
            let mut summary = self.mirror_dir(entry.path, target).await?;
            summary.directories += 1;
            Ok(summary)
        }
        .boxed_local()
    }

    async fn fetch_file(&self, entry: ContentEntry, target: PathBuf) -> HubResult<DownloadSummary> {
        let content = {
            let _permit = self.acquire().await?;
            self.transport
                .fetch_file(&entry)
                .await
                .map_err(|e| HubError::download(e, &entry.path))?
        };

        if let Some(parent) = target.parent() {
            create_dir(parent).await?;
        }
        tokio::fs::write(&target, &content)
            .await
            .map_err(|e| HubError::io(&target, e))?;
        debug!("Wrote {:?} ({} bytes)", target, content.len());

        Ok(DownloadSummary {
            files: 1,
            directories: 0,
            bytes: content.len() as u64,
        })
    }

    async fn acquire(&self) -> HubResult<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| HubError::InvalidState("download permits closed".to_string()))
    }
}

/// Entry names come from the remote side; refuse anything that could escape
/// the destination directory.
fn checked_name<'e>(entry: &'e ContentEntry, remote: &str) -> HubResult<&'e str> {
    let name = entry.name.as_str();
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(HubError::format(
            remote,
            format!("refusing to write entry with unsafe name {:?}", name),
        ));
    }
    Ok(name)
}

async fn create_dir(path: &Path) -> HubResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| HubError::io(path, e))
}
