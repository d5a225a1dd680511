use serde::{Deserialize, Serialize};

/// Server-assigned record identifier.
pub type RecordId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    /// Display label, not a key. `department_id` is the reference.
    pub department: String,
    pub department_id: Option<RecordId>,
    pub location_id: Option<RecordId>,
    pub manager_id: Option<RecordId>,
}

impl TeamMember {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Department {
    pub id: RecordId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
}

/// Payload for `createTeamMember`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeamMember {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub department: String,
    pub department_id: Option<RecordId>,
    pub location_id: Option<RecordId>,
    pub manager_id: Option<RecordId>,
}

/// Partial update for `updateTeamMember`. `None` leaves a field untouched; for
/// the nullable references `Some(None)` clears the link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Option<RecordId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<Option<RecordId>>,
}

impl TeamMemberPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch to a local copy. Used only by the optimistic mode and fakes.
    pub fn apply_to(&self, member: &mut TeamMember) {
        if let Some(value) = &self.first_name {
            member.first_name = value.clone();
        }
        if let Some(value) = &self.last_name {
            member.last_name = value.clone();
        }
        if let Some(value) = &self.email {
            member.email = value.clone();
        }
        if let Some(value) = &self.position {
            member.position = value.clone();
        }
        if let Some(value) = &self.department {
            member.department = value.clone();
        }
        if let Some(value) = self.department_id {
            member.department_id = value;
        }
        if let Some(value) = self.location_id {
            member.location_id = value;
        }
        if let Some(value) = self.manager_id {
            member.manager_id = value;
        }
    }
}
