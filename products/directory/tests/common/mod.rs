#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use platform_api::ErrorCode;
use products_directory::{
    CandidateRecord, Department, DirectoryRemote, FieldValue, Location, NewTeamMember, RecordId,
    RemoteError, RemoteResult, TeamMember, TeamMemberPatch,
};
use tokio::sync::Notify;

type SideEffect = Box<dyn FnOnce(&mut Vec<TeamMember>) + Send>;

#[derive(Default)]
struct FakeState {
    members: Vec<TeamMember>,
    departments: Vec<Department>,
    locations: Vec<Location>,
    next_id: RecordId,
    failures: HashMap<&'static str, RemoteError>,
    side_effect: Option<SideEffect>,
    imported: Vec<Vec<CandidateRecord>>,
}

/// In-memory stand-in for the directory server.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<&'static str>>,
    department_gate: Mutex<Option<Arc<Notify>>>,
}

pub fn member(id: RecordId, first: &str, last: &str, manager_id: Option<RecordId>) -> TeamMember {
    TeamMember {
        id,
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@example.test", first.to_lowercase(), last.to_lowercase()),
        position: "Engineer".into(),
        department: "Engineering".into(),
        department_id: Some(1),
        location_id: Some(1),
        manager_id,
    }
}

pub fn new_member(first: &str, last: &str) -> NewTeamMember {
    NewTeamMember {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}@example.test", first.to_lowercase()),
        position: "Analyst".into(),
        department: "Research".into(),
        department_id: Some(2),
        location_id: None,
        manager_id: Some(1),
    }
}

pub fn network_error() -> RemoteError {
    RemoteError::Transport("connection refused".into())
}

impl FakeRemote {
    pub fn seeded() -> Self {
        let remote = Self::default();
        {
            let mut state = remote.state.lock().unwrap();
            state.members = vec![
                member(1, "Ada", "Lovelace", None),
                member(2, "Grace", "Hopper", Some(1)),
                member(3, "Alan", "Turing", Some(1)),
            ];
            state.departments = vec![
                Department {
                    id: 1,
                    name: "Engineering".into(),
                },
                Department {
                    id: 2,
                    name: "Research".into(),
                },
            ];
            state.locations = vec![Location {
                id: 1,
                name: "London".into(),
            }];
            state.next_id = 4;
        }
        remote
    }

    /// Every call to `operation` rejects with `err` until cleared.
    pub fn fail(&self, operation: &'static str, err: RemoteError) {
        self.state.lock().unwrap().failures.insert(operation, err);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.state.lock().unwrap().failures.remove(operation);
    }

    /// Runs once against the server data right after the next successful
    /// mutation, standing in for another client writing concurrently.
    pub fn after_next_mutation(&self, effect: impl FnOnce(&mut Vec<TeamMember>) + Send + 'static) {
        self.state.lock().unwrap().side_effect = Some(Box::new(effect));
    }

    /// Changes server data directly, as another client would.
    pub fn edit_members(&self, edit: impl FnOnce(&mut Vec<TeamMember>)) {
        edit(&mut self.state.lock().unwrap().members);
    }

    /// Holds department reads until the returned handle is notified.
    pub fn gate_departments(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.department_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|call| **call == operation).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn server_members(&self) -> Vec<TeamMember> {
        self.state.lock().unwrap().members.clone()
    }

    pub fn imported_batches(&self) -> Vec<Vec<CandidateRecord>> {
        self.state.lock().unwrap().imported.clone()
    }

    fn enter(&self, operation: &'static str) -> RemoteResult<std::sync::MutexGuard<'_, FakeState>> {
        self.calls.lock().unwrap().push(operation);
        let state = self.state.lock().unwrap();
        if let Some(err) = state.failures.get(operation).cloned() {
            return Err(err);
        }
        Ok(state)
    }

    fn finish_mutation(state: &mut FakeState) {
        if let Some(effect) = state.side_effect.take() {
            effect(&mut state.members);
        }
    }
}

fn not_found(operation: &'static str, id: RecordId) -> RemoteError {
    RemoteError::Rejected {
        operation,
        code: ErrorCode::NotFound,
        message: format!("team member {id} not found"),
    }
}

fn text(candidate: &CandidateRecord, key: &str) -> String {
    candidate
        .get(key)
        .and_then(FieldValue::as_text)
        .unwrap_or_default()
        .to_string()
}

impl DirectoryRemote for FakeRemote {
    async fn fetch_members(&self) -> RemoteResult<Vec<TeamMember>> {
        Ok(self.enter("fetch_members")?.members.clone())
    }

    async fn fetch_departments(&self) -> RemoteResult<Vec<Department>> {
        let gate = self.department_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.enter("fetch_departments")?.departments.clone())
    }

    async fn fetch_locations(&self) -> RemoteResult<Vec<Location>> {
        Ok(self.enter("fetch_locations")?.locations.clone())
    }

    async fn create_member(&self, data: &NewTeamMember) -> RemoteResult<TeamMember> {
        let mut state = self.enter("create_member")?;
        let created = TeamMember {
            id: state.next_id,
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            email: data.email.clone(),
            position: data.position.clone(),
            department: data.department.clone(),
            department_id: data.department_id,
            location_id: data.location_id,
            manager_id: data.manager_id,
        };
        state.next_id += 1;
        state.members.push(created.clone());
        Self::finish_mutation(&mut state);
        Ok(created)
    }

    async fn update_member(&self, id: RecordId, patch: &TeamMemberPatch) -> RemoteResult<TeamMember> {
        let mut state = self.enter("update_member")?;
        let updated = {
            let existing = state
                .members
                .iter_mut()
                .find(|member| member.id == id)
                .ok_or_else(|| not_found("updateTeamMember", id))?;
            patch.apply_to(existing);
            existing.clone()
        };
        Self::finish_mutation(&mut state);
        Ok(updated)
    }

    async fn delete_member(&self, id: RecordId) -> RemoteResult<bool> {
        let mut state = self.enter("delete_member")?;
        let before = state.members.len();
        state.members.retain(|member| member.id != id);
        if state.members.len() == before {
            return Err(not_found("deleteTeamMember", id));
        }
        Self::finish_mutation(&mut state);
        Ok(true)
    }

    async fn import_members(&self, batch: &[CandidateRecord]) -> RemoteResult<Vec<TeamMember>> {
        let mut state = self.enter("import_members")?;
        state.imported.push(batch.to_vec());
        let mut created = Vec::with_capacity(batch.len());
        for candidate in batch {
            let id = state.next_id;
            state.next_id += 1;
            created.push(TeamMember {
                id,
                first_name: text(candidate, "firstName"),
                last_name: text(candidate, "lastName"),
                email: text(candidate, "email"),
                position: text(candidate, "position"),
                department: text(candidate, "department"),
                department_id: candidate.get("departmentId").and_then(FieldValue::as_id),
                location_id: candidate.get("locationId").and_then(FieldValue::as_id),
                manager_id: candidate.get("managerId").and_then(FieldValue::as_id),
            });
        }
        state.members.extend(created.iter().cloned());
        Self::finish_mutation(&mut state);
        Ok(created)
    }
}
