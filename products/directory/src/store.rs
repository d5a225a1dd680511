//! In-memory record store: the last fetched copy of each collection.
//!
//! The sync service is the only writer. Each collection sits behind its own
//! lock so concurrent refreshes of different collections never contend, and
//! readers take `Arc` snapshots instead of holding a guard.

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::warn;

use crate::{
    error::RemoteError,
    model::{Department, Location, RecordId, TeamMember},
    views::Snapshot,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Members,
    Departments,
    Locations,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Members,
        Collection::Departments,
        Collection::Locations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Members => "teamMembers",
            Collection::Departments => "departments",
            Collection::Locations => "locations",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

trait Keyed {
    fn key(&self) -> RecordId;
}

impl Keyed for TeamMember {
    fn key(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Department {
    fn key(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Location {
    fn key(&self) -> RecordId {
        self.id
    }
}

struct Slot<T> {
    records: Arc<[T]>,
    in_flight: usize,
    error: Option<RemoteError>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            in_flight: 0,
            error: None,
        }
    }
}

impl<T: Keyed> Slot<T> {
    fn begin(&mut self) {
        self.in_flight += 1;
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn replace(&mut self, collection: Collection, records: Vec<T>) {
        self.settle();
        self.records = Arc::from(dedupe(collection, records));
        self.error = None;
    }

    fn fail(&mut self, err: RemoteError) {
        self.settle();
        self.error = Some(err);
    }
}

/// Keeps the first record for each id, preserving fetch order.
fn dedupe<T: Keyed>(collection: Collection, records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let unique: Vec<T> = records
        .into_iter()
        .filter(|record| seen.insert(record.key()))
        .collect();
    if unique.len() != before {
        warn!(
            %collection,
            dropped = before - unique.len(),
            "fetch returned duplicate ids; keeping first occurrence"
        );
    }
    unique
}

#[derive(Default)]
pub struct RecordStore {
    members: RwLock<Slot<TeamMember>>,
    departments: RwLock<Slot<Department>>,
    locations: RwLock<Slot<Location>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_shared(
            read(&self.members).records.clone(),
            read(&self.departments).records.clone(),
            read(&self.locations).records.clone(),
        )
    }

    pub fn members(&self) -> Arc<[TeamMember]> {
        read(&self.members).records.clone()
    }

    /// True while any read of any collection is outstanding.
    pub fn is_loading(&self) -> bool {
        read(&self.members).in_flight > 0
            || read(&self.departments).in_flight > 0
            || read(&self.locations).in_flight > 0
    }

    pub fn is_collection_loading(&self, collection: Collection) -> bool {
        match collection {
            Collection::Members => read(&self.members).in_flight > 0,
            Collection::Departments => read(&self.departments).in_flight > 0,
            Collection::Locations => read(&self.locations).in_flight > 0,
        }
    }

    /// Error from the most recent settled read of `collection`, if it failed.
    pub fn error(&self, collection: Collection) -> Option<RemoteError> {
        match collection {
            Collection::Members => read(&self.members).error.clone(),
            Collection::Departments => read(&self.departments).error.clone(),
            Collection::Locations => read(&self.locations).error.clone(),
        }
    }

    pub fn begin_load(&self, collection: Collection) {
        match collection {
            Collection::Members => write(&self.members).begin(),
            Collection::Departments => write(&self.departments).begin(),
            Collection::Locations => write(&self.locations).begin(),
        }
    }

    pub fn fail_load(&self, collection: Collection, err: RemoteError) {
        match collection {
            Collection::Members => write(&self.members).fail(err),
            Collection::Departments => write(&self.departments).fail(err),
            Collection::Locations => write(&self.locations).fail(err),
        }
    }

    pub fn replace_members(&self, records: Vec<TeamMember>) {
        write(&self.members).replace(Collection::Members, records);
    }

    pub fn replace_departments(&self, records: Vec<Department>) {
        write(&self.departments).replace(Collection::Departments, records);
    }

    pub fn replace_locations(&self, records: Vec<Location>) {
        write(&self.locations).replace(Collection::Locations, records);
    }

    /// Optimistic patch: put a server-confirmed member in place (or append it)
    /// ahead of the confirming re-fetch.
    pub fn upsert_member(&self, member: TeamMember) {
        let mut slot = write(&self.members);
        let mut records = slot.records.to_vec();
        match records.iter_mut().find(|existing| existing.id == member.id) {
            Some(existing) => *existing = member,
            None => records.push(member),
        }
        slot.records = Arc::from(records);
    }

    pub fn remove_member(&self, id: RecordId) {
        let mut slot = write(&self.members);
        if slot.records.iter().any(|member| member.id == id) {
            let records: Vec<TeamMember> = slot
                .records
                .iter()
                .filter(|member| member.id != id)
                .cloned()
                .collect();
            slot.records = Arc::from(records);
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
