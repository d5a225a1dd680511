//! Client-side core of the team directory.
//!
//! [`DirectoryService`] owns the [`RecordStore`] and is its only writer: it
//! loads members, departments and locations through a [`DirectoryRemote`],
//! re-fetches members after every successful write, and runs CSV imports
//! through [`csv_import`]. Consumers read through [`Snapshot`], whose
//! projections are pure functions of the snapshot they are called on.

pub mod config;
pub mod csv_import;
pub mod error;
pub mod graphql;
pub mod model;
pub mod remote;
pub mod store;
pub mod sync;
pub mod views;

pub use config::{ClientConfig, SyncOptions};
pub use csv_import::{
    CandidateRecord, ColumnMismatch, FieldValue, ImportOptions, ImportSummary, InvalidId,
    RejectedRow, RowRejection,
};
pub use error::{DirectoryError, DirectoryResult, ParseError, RemoteError, RemoteResult};
pub use graphql::GraphqlRemote;
pub use model::{Department, Location, NewTeamMember, RecordId, TeamMember, TeamMemberPatch};
pub use remote::DirectoryRemote;
pub use store::{Collection, RecordStore};
pub use sync::DirectoryService;
pub use views::Snapshot;
