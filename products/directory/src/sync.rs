//! The directory service: the single writer of the record store.
//!
//! Every successful mutation is followed by exactly one re-fetch of the member
//! collection. Nothing is patched locally before the server confirms a write,
//! and the re-fetch always has the last word, optimistic mode included.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::SyncOptions,
    csv_import::{self, CandidateRecord, ImportSummary},
    error::{DirectoryError, DirectoryResult, RemoteError, RemoteResult},
    model::{NewTeamMember, RecordId, TeamMember, TeamMemberPatch},
    remote::DirectoryRemote,
    store::{Collection, RecordStore},
    views::Snapshot,
};

/// Explicit service object owning the record store. Build one per session,
/// share it by reference (or `Arc`), and `close()` it on teardown.
pub struct DirectoryService<R> {
    remote: R,
    store: RecordStore,
    options: SyncOptions,
    open: AtomicBool,
}

impl<R: DirectoryRemote> DirectoryService<R> {
    pub fn new(remote: R) -> Self {
        Self::with_options(remote, SyncOptions::default())
    }

    pub fn with_options(remote: R, options: SyncOptions) -> Self {
        Self {
            remote,
            store: RecordStore::new(),
            options,
            open: AtomicBool::new(true),
        }
    }

    /// Builds the service and performs the initial load of all collections.
    pub async fn connect(remote: R, options: SyncOptions) -> Self {
        let service = Self::with_options(remote, options);
        // fetch_all only errors on a closed service.
        let _ = service.fetch_all().await;
        service
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Ends the session. Any later read or write fails with
    /// [`DirectoryError::ContextMisuse`].
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!("directory service closed");
        }
    }

    fn ensure_open(&self) -> DirectoryResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DirectoryError::ContextMisuse)
        }
    }

    pub fn snapshot(&self) -> DirectoryResult<Snapshot> {
        self.ensure_open()?;
        Ok(self.store.snapshot())
    }

    /// True while any of the three collection reads is outstanding.
    pub fn is_loading(&self) -> DirectoryResult<bool> {
        self.ensure_open()?;
        Ok(self.store.is_loading())
    }

    /// Failure of the latest member read. Department and location failures
    /// are reported by [`collection_error`](Self::collection_error) only.
    pub fn error(&self) -> DirectoryResult<Option<RemoteError>> {
        self.collection_error(Collection::Members)
    }

    pub fn collection_error(
        &self,
        collection: Collection,
    ) -> DirectoryResult<Option<RemoteError>> {
        self.ensure_open()?;
        Ok(self.store.error(collection))
    }

    /// Issues the three collection reads concurrently. Each collection is
    /// replaced as soon as its own read resolves; failures land in the
    /// per-collection error channels rather than in the return value.
    #[instrument(name = "directory.fetch_all", skip_all)]
    pub async fn fetch_all(&self) -> DirectoryResult<()> {
        self.ensure_open()?;
        for collection in Collection::ALL {
            self.store.begin_load(collection);
        }
        let _ = tokio::join!(
            self.load_members(),
            self.load_departments(),
            self.load_locations()
        );
        Ok(())
    }

    /// Re-fetches the member collection alone.
    pub async fn refresh_members(&self) -> DirectoryResult<()> {
        self.ensure_open()?;
        self.store.begin_load(Collection::Members);
        self.load_members().await.map_err(DirectoryError::from)
    }

    #[instrument(name = "directory.create_member", skip_all)]
    pub async fn create_member(&self, data: NewTeamMember) -> DirectoryResult<TeamMember> {
        self.ensure_open()?;
        let created = self
            .remote
            .create_member(&data)
            .await
            .inspect_err(|err| error!(error = %err, "error creating team member"))?;
        if self.options.optimistic_patch {
            self.store.upsert_member(created.clone());
        }
        self.confirm("createTeamMember").await;
        Ok(created)
    }

    #[instrument(name = "directory.update_member", skip(self, patch))]
    pub async fn update_member(
        &self,
        id: RecordId,
        patch: TeamMemberPatch,
    ) -> DirectoryResult<TeamMember> {
        self.ensure_open()?;
        let updated = self
            .remote
            .update_member(id, &patch)
            .await
            .inspect_err(|err| error!(error = %err, "error updating team member"))?;
        if self.options.optimistic_patch {
            self.store.upsert_member(updated.clone());
        }
        self.confirm("updateTeamMember").await;
        Ok(updated)
    }

    #[instrument(name = "directory.delete_member", skip(self))]
    pub async fn delete_member(&self, id: RecordId) -> DirectoryResult<bool> {
        self.ensure_open()?;
        let removed = self
            .remote
            .delete_member(id)
            .await
            .inspect_err(|err| error!(error = %err, "error deleting team member"))?;
        if self.options.optimistic_patch && removed {
            self.store.remove_member(id);
        }
        self.confirm("deleteTeamMember").await;
        Ok(removed)
    }

    /// Sends the whole batch as one bulk create. A rejection covers the
    /// entire batch; there is no per-row outcome at this layer.
    #[instrument(name = "directory.import_members", skip_all, fields(rows = batch.len()))]
    pub async fn import_members(
        &self,
        batch: &[CandidateRecord],
    ) -> DirectoryResult<Vec<TeamMember>> {
        self.ensure_open()?;
        let created = self
            .remote
            .import_members(batch)
            .await
            .inspect_err(|err| error!(error = %err, "error importing team members"))?;
        if self.options.optimistic_patch {
            for member in &created {
                self.store.upsert_member(member.clone());
            }
        }
        self.confirm("importTeamMembers").await;
        Ok(created)
    }

    /// Parses `text` and submits the candidates in one bulk create.
    ///
    /// Structural problems yield [`DirectoryError::Parse`] before anything is
    /// sent; a rejected submission yields [`DirectoryError::Remote`].
    /// `imported` counts submitted rows, not rows the server kept.
    #[instrument(name = "directory.import_csv", skip_all, fields(bytes = text.len()))]
    pub async fn import_csv(&self, text: &str) -> DirectoryResult<ImportSummary> {
        self.ensure_open()?;
        let batch = csv_import::parse_members(text, &self.options.import)
            .inspect_err(|err| error!(error = %err, "error parsing CSV"))?;
        if !batch.candidates.is_empty() {
            self.import_members(&batch.candidates).await?;
        }
        info!(
            imported = batch.candidates.len(),
            rejected = batch.rejected.len(),
            "csv import finished"
        );
        Ok(ImportSummary {
            imported: batch.candidates.len(),
            rejected: batch.rejected,
        })
    }

    /// The one re-fetch that follows a successful mutation. The write already
    /// happened server-side, so a failed re-fetch is recorded, not returned.
    async fn confirm(&self, operation: &'static str) {
        self.store.begin_load(Collection::Members);
        if self.load_members().await.is_err() {
            debug!(operation, "member collection left stale after mutation");
        }
    }

    async fn load_members(&self) -> RemoteResult<()> {
        match self.remote.fetch_members().await {
            Ok(records) => {
                debug!(count = records.len(), "team members fetched");
                self.store.replace_members(records);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "team member fetch failed");
                self.store.fail_load(Collection::Members, err.clone());
                Err(err)
            }
        }
    }

    async fn load_departments(&self) -> RemoteResult<()> {
        match self.remote.fetch_departments().await {
            Ok(records) => {
                self.store.replace_departments(records);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "department fetch failed");
                self.store.fail_load(Collection::Departments, err.clone());
                Err(err)
            }
        }
    }

    async fn load_locations(&self) -> RemoteResult<()> {
        match self.remote.fetch_locations().await {
            Ok(records) => {
                self.store.replace_locations(records);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "location fetch failed");
                self.store.fail_load(Collection::Locations, err.clone());
                Err(err)
            }
        }
    }
}
