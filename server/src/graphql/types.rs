use async_graphql::{InputObject, MaybeUndefined, SimpleObject};
use serde::Serialize;

use crate::data::{MemberChanges, MemberDraft, MemberRecord, NamedRecord};

#[derive(Clone, Debug, SimpleObject, Serialize)]
#[graphql(name = "TeamMember")]
pub struct TeamMemberNode {
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

impl From<MemberRecord> for TeamMemberNode {
    fn from(record: MemberRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            position: record.position,
            department: record.department,
            department_id: record.department_id,
            location_id: record.location_id,
            manager_id: record.manager_id,
        }
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
#[graphql(name = "Department")]
pub struct DepartmentNode {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
#[graphql(name = "Location")]
pub struct LocationNode {
    pub id: i32,
    pub name: String,
}

impl From<NamedRecord> for DepartmentNode {
    fn from(record: NamedRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

impl From<NamedRecord> for LocationNode {
    fn from(record: NamedRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
    pub members: i32,
}

#[derive(Debug, InputObject)]
pub struct TeamMemberInput {
    pub first_name: String,
    pub last_name: String,
    #[graphql(default)]
    pub email: String,
    #[graphql(default)]
    pub position: String,
    #[graphql(default)]
    pub department: String,
    pub department_id: Option<i32>,
    pub location_id: Option<i32>,
    pub manager_id: Option<i32>,
}

impl From<TeamMemberInput> for MemberDraft {
    fn from(input: TeamMemberInput) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            position: input.position,
            department: input.department,
            department_id: input.department_id,
            location_id: input.location_id,
            manager_id: input.manager_id,
        }
    }
}

/// Omitted fields are left alone; an explicit `null` clears a reference.
#[derive(Debug, Default, InputObject)]
pub struct TeamMemberUpdateInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub department_id: MaybeUndefined<i32>,
    pub location_id: MaybeUndefined<i32>,
    pub manager_id: MaybeUndefined<i32>,
}

fn change(value: MaybeUndefined<i32>) -> Option<Option<i32>> {
    match value {
        MaybeUndefined::Undefined => None,
        MaybeUndefined::Null => Some(None),
        MaybeUndefined::Value(id) => Some(Some(id)),
    }
}

impl From<TeamMemberUpdateInput> for MemberChanges {
    fn from(input: TeamMemberUpdateInput) -> Self {
        Self {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            position: input.position,
            department: input.department,
            department_id: change(input.department_id),
            location_id: change(input.location_id),
            manager_id: change(input.manager_id),
        }
    }
}

/// One row of a bulk import. Every field is optional on the wire so that
/// sparse CSV rows reach validation instead of failing type checks.
#[derive(Debug, Default, InputObject)]
pub struct TeamMemberImportInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub department_id: Option<i32>,
    pub location_id: Option<i32>,
    pub manager_id: Option<i32>,
}

impl From<TeamMemberImportInput> for MemberDraft {
    fn from(input: TeamMemberImportInput) -> Self {
        Self {
            first_name: input.first_name.unwrap_or_default(),
            last_name: input.last_name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            position: input.position.unwrap_or_default(),
            department: input.department.unwrap_or_default(),
            department_id: input.department_id,
            location_id: input.location_id,
            manager_id: input.manager_id,
        }
    }
}
