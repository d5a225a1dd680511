//! In-memory directory data behind the GraphQL schema.
//!
//! Nothing here outlives the process. Writes take the table lock for their
//! whole validate-then-apply step, so a bulk import is all-or-nothing.

use platform_api::{ApiError, ApiResult};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRecord {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub department_id: Option<i32>,
    pub location_id: Option<i32>,
    pub manager_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedRecord {
    pub id: i32,
    pub name: String,
}

/// Fields for a member that does not exist yet.
#[derive(Clone, Debug, Default)]
pub struct MemberDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub department_id: Option<i32>,
    pub location_id: Option<i32>,
    pub manager_id: Option<i32>,
}

/// Partial update; `Some(None)` clears a reference.
#[derive(Clone, Debug, Default)]
pub struct MemberChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub department_id: Option<Option<i32>>,
    pub location_id: Option<Option<i32>>,
    pub manager_id: Option<Option<i32>>,
}

#[derive(Default)]
struct Tables {
    members: Vec<MemberRecord>,
    departments: Vec<NamedRecord>,
    locations: Vec<NamedRecord>,
    next_member_id: i32,
}

impl Tables {
    fn has_member(&self, id: i32) -> bool {
        self.members.iter().any(|member| member.id == id)
    }

    fn department_name(&self, id: i32) -> Option<&str> {
        self.departments
            .iter()
            .find(|department| department.id == id)
            .map(|department| department.name.as_str())
    }

    fn check_references(&self, record: &MemberRecord) -> ApiResult<()> {
        if let Some(id) = record.department_id {
            if self.department_name(id).is_none() {
                return Err(ApiError::invalid(format!("unknown departmentId {id}")));
            }
        }
        if let Some(id) = record.location_id {
            if !self.locations.iter().any(|location| location.id == id) {
                return Err(ApiError::invalid(format!("unknown locationId {id}")));
            }
        }
        if let Some(id) = record.manager_id {
            if id == record.id {
                return Err(ApiError::invalid("a member cannot manage themselves"));
            }
            if !self.has_member(id) {
                return Err(ApiError::invalid(format!("unknown managerId {id}")));
            }
        }
        Ok(())
    }

    /// Builds the record `draft` would become, without inserting it.
    fn materialize(&self, id: i32, draft: MemberDraft) -> ApiResult<MemberRecord> {
        let first_name = required("firstName", draft.first_name)?;
        let last_name = required("lastName", draft.last_name)?;
        let mut department = draft.department.trim().to_string();
        if department.is_empty() {
            if let Some(name) = draft.department_id.and_then(|id| self.department_name(id)) {
                department = name.to_string();
            }
        }
        let record = MemberRecord {
            id,
            first_name,
            last_name,
            email: draft.email.trim().to_string(),
            position: draft.position.trim().to_string(),
            department,
            department_id: draft.department_id,
            location_id: draft.location_id,
            manager_id: draft.manager_id,
        };
        self.check_references(&record)?;
        Ok(record)
    }
}

fn required(field: &str, value: String) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub struct DirectoryData {
    tables: RwLock<Tables>,
}

impl Default for DirectoryData {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl DirectoryData {
    pub fn new(departments: Vec<NamedRecord>, locations: Vec<NamedRecord>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                departments,
                locations,
                next_member_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Departments and locations without any members.
    pub fn reference() -> Self {
        Self::new(
            named(&["Engineering", "Research", "Operations"]),
            named(&["London", "Paris", "Remote"]),
        )
    }

    /// Demo organisation used by `serve` unless seeding is disabled.
    pub async fn seeded() -> ApiResult<Self> {
        let data = Self::reference();
        let people = [
            ("Ada", "Lovelace", "CTO", 1, 1, None),
            ("Grace", "Hopper", "Compiler Lead", 1, 3, Some(1)),
            ("Katherine", "Johnson", "Head of Research", 2, 2, Some(1)),
            ("Alan", "Turing", "Researcher", 2, 1, Some(3)),
            ("Margaret", "Hamilton", "Operations Manager", 3, 3, Some(1)),
        ];
        for (first, last, position, department_id, location_id, manager_id) in people {
            data.create(MemberDraft {
                first_name: first.into(),
                last_name: last.into(),
                email: format!("{}.{}@example.test", first.to_lowercase(), last.to_lowercase()),
                position: position.into(),
                department: String::new(),
                department_id: Some(department_id),
                location_id: Some(location_id),
                manager_id,
            })
            .await?;
        }
        info!(members = people.len(), "seeded demo directory");
        Ok(data)
    }

    pub async fn members(&self) -> Vec<MemberRecord> {
        self.tables.read().await.members.clone()
    }

    pub async fn member(&self, id: i32) -> Option<MemberRecord> {
        self.tables
            .read()
            .await
            .members
            .iter()
            .find(|member| member.id == id)
            .cloned()
    }

    pub async fn departments(&self) -> Vec<NamedRecord> {
        self.tables.read().await.departments.clone()
    }

    pub async fn locations(&self) -> Vec<NamedRecord> {
        self.tables.read().await.locations.clone()
    }

    pub async fn create(&self, draft: MemberDraft) -> ApiResult<MemberRecord> {
        let mut tables = self.tables.write().await;
        let id = tables.next_member_id;
        let next_id = id
            .checked_add(1)
            .ok_or_else(|| ApiError::invalid("member id range exhausted"))?;
        let record = tables.materialize(id, draft)?;
        tables.next_member_id = next_id;
        tables.members.push(record.clone());
        Ok(record)
    }

    pub async fn update(&self, id: i32, changes: MemberChanges) -> ApiResult<MemberRecord> {
        let mut tables = self.tables.write().await;
        let position = tables
            .members
            .iter()
            .position(|member| member.id == id)
            .ok_or_else(|| ApiError::not_found("team member", id))?;

        let mut next = tables.members[position].clone();
        if let Some(value) = changes.first_name {
            next.first_name = required("firstName", value)?;
        }
        if let Some(value) = changes.last_name {
            next.last_name = required("lastName", value)?;
        }
        if let Some(value) = changes.email {
            next.email = value.trim().to_string();
        }
        if let Some(value) = changes.position {
            next.position = value.trim().to_string();
        }
        if let Some(value) = changes.department {
            next.department = value.trim().to_string();
        }
        if let Some(value) = changes.department_id {
            next.department_id = value;
        }
        if let Some(value) = changes.location_id {
            next.location_id = value;
        }
        if let Some(value) = changes.manager_id {
            next.manager_id = value;
        }
        tables.check_references(&next)?;
        tables.members[position] = next.clone();
        Ok(next)
    }

    /// Removes the member. Reports that pointed at them lose their manager.
    pub async fn delete(&self, id: i32) -> ApiResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.has_member(id) {
            return Err(ApiError::not_found("team member", id));
        }
        tables.members.retain(|member| member.id != id);
        for member in tables.members.iter_mut() {
            if member.manager_id == Some(id) {
                member.manager_id = None;
            }
        }
        Ok(())
    }

    /// Inserts every draft or none of them.
    pub async fn import(&self, drafts: Vec<MemberDraft>) -> ApiResult<Vec<MemberRecord>> {
        let mut tables = self.tables.write().await;
        let first_id = tables.next_member_id;
        let next_id = i32::try_from(drafts.len())
            .ok()
            .and_then(|count| first_id.checked_add(count))
            .ok_or_else(|| ApiError::invalid("import batch exhausts the member id range"))?;
        let mut staged = Vec::with_capacity(drafts.len());
        for (id, draft) in (first_id..next_id).zip(drafts) {
            let row = id - first_id + 1;
            let record = tables.materialize(id, draft).map_err(|err| {
                ApiError::invalid(format!("row {row}: {}", strip_prefix(&err)))
            })?;
            staged.push(record);
        }
        tables.next_member_id = next_id;
        tables.members.extend(staged.iter().cloned());
        info!(count = staged.len(), "team members imported");
        Ok(staged)
    }
}

fn strip_prefix(err: &ApiError) -> String {
    match err {
        ApiError::InvalidInput(message) => message.clone(),
        other => other.to_string(),
    }
}

fn named(names: &[&str]) -> Vec<NamedRecord> {
    names
        .iter()
        .zip(1..)
        .map(|(name, id)| NamedRecord {
            id,
            name: (*name).to_string(),
        })
        .collect()
}
