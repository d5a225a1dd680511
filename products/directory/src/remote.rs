//! The seam between the record store and whatever serves the directory data.

use std::future::Future;

use crate::{
    csv_import::CandidateRecord,
    error::RemoteResult,
    model::{Department, Location, NewTeamMember, RecordId, TeamMember, TeamMemberPatch},
};

/// Remote data-access operations the sync service depends on.
///
/// Reads return records in server order. Every method must reject with a
/// [`RemoteError`](crate::RemoteError) on failure rather than returning partial data.
pub trait DirectoryRemote: Send + Sync {
    fn fetch_members(&self) -> impl Future<Output = RemoteResult<Vec<TeamMember>>> + Send;

    fn fetch_departments(&self) -> impl Future<Output = RemoteResult<Vec<Department>>> + Send;

    fn fetch_locations(&self) -> impl Future<Output = RemoteResult<Vec<Location>>> + Send;

    fn create_member(
        &self,
        data: &NewTeamMember,
    ) -> impl Future<Output = RemoteResult<TeamMember>> + Send;

    fn update_member(
        &self,
        id: RecordId,
        patch: &TeamMemberPatch,
    ) -> impl Future<Output = RemoteResult<TeamMember>> + Send;

    /// Resolves to `true` when the server removed the record.
    fn delete_member(&self, id: RecordId) -> impl Future<Output = RemoteResult<bool>> + Send;

    /// Bulk create. The server applies the batch all-or-nothing.
    fn import_members(
        &self,
        batch: &[CandidateRecord],
    ) -> impl Future<Output = RemoteResult<Vec<TeamMember>>> + Send;
}
