//! [`DirectoryRemote`] over the directory server's GraphQL endpoint.

use std::time::{Duration, Instant};

use platform_api::ErrorCode;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::{
    config::ClientConfig,
    csv_import::CandidateRecord,
    error::{RemoteError, RemoteResult},
    model::{Department, Location, NewTeamMember, RecordId, TeamMember, TeamMemberPatch},
    remote::DirectoryRemote,
};

macro_rules! member_fields {
    () => {
        "id firstName lastName email position department departmentId locationId managerId"
    };
}

const TEAM_MEMBERS: &str = concat!("query TeamMembers { teamMembers { ", member_fields!(), " } }");
const DEPARTMENTS: &str = "query Departments { departments { id name } }";
const LOCATIONS: &str = "query Locations { locations { id name } }";
const CREATE_TEAM_MEMBER: &str = concat!(
    "mutation CreateTeamMember($data: TeamMemberInput!) { createTeamMember(data: $data) { ",
    member_fields!(),
    " } }"
);
const UPDATE_TEAM_MEMBER: &str = concat!(
    "mutation UpdateTeamMember($id: Int!, $data: TeamMemberUpdateInput!) { updateTeamMember(id: $id, data: $data) { ",
    member_fields!(),
    " } }"
);
const DELETE_TEAM_MEMBER: &str =
    "mutation DeleteTeamMember($id: Int!) { deleteTeamMember(id: $id) }";
const IMPORT_TEAM_MEMBERS: &str = concat!(
    "mutation ImportTeamMembers($members: [TeamMemberImportInput!]!) { importTeamMembers(members: $members) { ",
    member_fields!(),
    " } }"
);

const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

#[derive(Deserialize)]
struct Envelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Deserialize)]
struct ErrorExtensions {
    code: Option<ErrorCode>,
}

/// HTTP client for the directory GraphQL API.
///
/// ```rust,no_run
/// use products_directory::GraphqlRemote;
///
/// # fn example() -> Result<(), products_directory::RemoteError> {
/// let remote = GraphqlRemote::builder()
///     .endpoint("http://localhost:4000/graphql")
///     .timeout(std::time::Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GraphqlRemote {
    endpoint: String,
    http: reqwest::Client,
}

impl GraphqlRemote {
    pub fn builder() -> GraphqlRemoteBuilder {
        GraphqlRemoteBuilder::default()
    }

    pub fn from_config(config: &ClientConfig) -> RemoteResult<Self> {
        Self::builder()
            .endpoint(config.endpoint.clone())
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one GraphQL document and decodes `data.<field>`.
    async fn execute<T: DeserializeOwned>(
        &self,
        field: &'static str,
        document: &str,
        variables: Value,
    ) -> RemoteResult<T> {
        let start = Instant::now();
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await?;
        let status = response.status();
        debug!(operation = field, %status, elapsed = ?start.elapsed(), "graphql response received");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response.json().await.map_err(|err| RemoteError::Decode {
            operation: field,
            message: err.to_string(),
        })?;
        decode_envelope(field, envelope)
    }
}

fn decode_envelope<T: DeserializeOwned>(field: &'static str, envelope: Envelope) -> RemoteResult<T> {
    if let Some(first) = envelope.errors.into_iter().next() {
        let code = first
            .extensions
            .and_then(|ext| ext.code)
            .unwrap_or_else(|| ErrorCode::Other("GRAPHQL_ERROR".into()));
        return Err(RemoteError::Rejected {
            operation: field,
            code,
            message: first.message,
        });
    }
    let payload = envelope
        .data
        .and_then(|mut data| data.get_mut(field).map(Value::take))
        .ok_or_else(|| RemoteError::Decode {
            operation: field,
            message: format!("response has no `{field}` field"),
        })?;
    serde_json::from_value(payload).map_err(|err| RemoteError::Decode {
        operation: field,
        message: err.to_string(),
    })
}

impl DirectoryRemote for GraphqlRemote {
    #[instrument(name = "remote.team_members", skip_all)]
    async fn fetch_members(&self) -> RemoteResult<Vec<TeamMember>> {
        self.execute("teamMembers", TEAM_MEMBERS, json!({})).await
    }

    #[instrument(name = "remote.departments", skip_all)]
    async fn fetch_departments(&self) -> RemoteResult<Vec<Department>> {
        self.execute("departments", DEPARTMENTS, json!({})).await
    }

    #[instrument(name = "remote.locations", skip_all)]
    async fn fetch_locations(&self) -> RemoteResult<Vec<Location>> {
        self.execute("locations", LOCATIONS, json!({})).await
    }

    #[instrument(name = "remote.create_team_member", skip_all)]
    async fn create_member(&self, data: &NewTeamMember) -> RemoteResult<TeamMember> {
        self.execute("createTeamMember", CREATE_TEAM_MEMBER, json!({ "data": data }))
            .await
    }

    #[instrument(name = "remote.update_team_member", skip(self, patch))]
    async fn update_member(&self, id: RecordId, patch: &TeamMemberPatch) -> RemoteResult<TeamMember> {
        self.execute(
            "updateTeamMember",
            UPDATE_TEAM_MEMBER,
            json!({ "id": id, "data": patch }),
        )
        .await
    }

    #[instrument(name = "remote.delete_team_member", skip(self))]
    async fn delete_member(&self, id: RecordId) -> RemoteResult<bool> {
        self.execute("deleteTeamMember", DELETE_TEAM_MEMBER, json!({ "id": id }))
            .await
    }

    #[instrument(name = "remote.import_team_members", skip_all, fields(rows = batch.len()))]
    async fn import_members(&self, batch: &[CandidateRecord]) -> RemoteResult<Vec<TeamMember>> {
        self.execute(
            "importTeamMembers",
            IMPORT_TEAM_MEMBERS,
            json!({ "members": batch }),
        )
        .await
    }
}

#[derive(Debug)]
pub struct GraphqlRemoteBuilder {
    endpoint: String,
    timeout: Duration,
    connect_timeout: Duration,
}

impl Default for GraphqlRemoteBuilder {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl GraphqlRemoteBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Upper bound for a whole request, response body included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> RemoteResult<GraphqlRemote> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(GraphqlRemote {
            endpoint: self.endpoint,
            http,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn documents_select_every_member_field() {
        assert!(TEAM_MEMBERS.contains("teamMembers { id firstName"));
        assert!(IMPORT_TEAM_MEMBERS.contains("managerId } }"));
    }

    #[test]
    fn data_field_is_decoded() {
        let decoded: Vec<Department> = decode_envelope(
            "departments",
            envelope(json!({ "data": { "departments": [{ "id": 1, "name": "Ops" }] } })),
        )
        .unwrap();
        assert_eq!(decoded[0].name, "Ops");
    }

    #[test]
    fn graphql_errors_become_rejections_with_code() {
        let err = decode_envelope::<bool>(
            "deleteTeamMember",
            envelope(json!({
                "data": null,
                "errors": [{ "message": "team member 9 not found", "extensions": { "code": "NOT_FOUND" } }]
            })),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RemoteError::Rejected {
                operation: "deleteTeamMember",
                code: ErrorCode::NotFound,
                message: "team member 9 not found".into(),
            }
        );
    }

    #[test]
    fn errors_without_code_are_still_rejections() {
        let err = decode_envelope::<bool>(
            "importTeamMembers",
            envelope(json!({ "errors": [{ "message": "Invalid value for argument" }] })),
        )
        .unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::Other("GRAPHQL_ERROR".into())));
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let err = decode_envelope::<bool>("deleteTeamMember", envelope(json!({ "data": {} })))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Decode { .. }));
    }
}
