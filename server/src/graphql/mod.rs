mod types;

use std::sync::Arc;

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Object, Result, Schema};
use platform_api::internal_error;
use tracing::instrument;

use crate::data::DirectoryData;

pub use types::{
    DepartmentNode, HealthPayload, LocationNode, TeamMemberImportInput, TeamMemberInput,
    TeamMemberNode, TeamMemberUpdateInput,
};

pub type DirectorySchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(data: Arc<DirectoryData>) -> DirectorySchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(data)
        .finish()
}

fn directory<'a>(ctx: &Context<'a>) -> Result<&'a Arc<DirectoryData>> {
    ctx.data::<Arc<DirectoryData>>()
        .map_err(|err| internal_error(anyhow::anyhow!("directory data missing: {}", err.message)))
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self, ctx: &Context<'_>) -> Result<HealthPayload> {
        let members = directory(ctx)?.members().await.len();
        Ok(HealthPayload {
            ok: true,
            members: i32::try_from(members).unwrap_or(i32::MAX),
        })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    #[instrument(name = "graphql.team_members", skip_all)]
    async fn team_members(&self, ctx: &Context<'_>) -> Result<Vec<TeamMemberNode>> {
        let members = directory(ctx)?.members().await;
        Ok(members.into_iter().map(TeamMemberNode::from).collect())
    }

    #[instrument(name = "graphql.team_member", skip(self, ctx))]
    async fn team_member(&self, ctx: &Context<'_>, id: i32) -> Result<Option<TeamMemberNode>> {
        Ok(directory(ctx)?.member(id).await.map(TeamMemberNode::from))
    }

    #[instrument(name = "graphql.departments", skip_all)]
    async fn departments(&self, ctx: &Context<'_>) -> Result<Vec<DepartmentNode>> {
        let departments = directory(ctx)?.departments().await;
        Ok(departments.into_iter().map(DepartmentNode::from).collect())
    }

    #[instrument(name = "graphql.locations", skip_all)]
    async fn locations(&self, ctx: &Context<'_>) -> Result<Vec<LocationNode>> {
        let locations = directory(ctx)?.locations().await;
        Ok(locations.into_iter().map(LocationNode::from).collect())
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    #[instrument(name = "graphql.create_team_member", skip_all)]
    async fn create_team_member(
        &self,
        ctx: &Context<'_>,
        data: TeamMemberInput,
    ) -> Result<TeamMemberNode> {
        directory(ctx)?
            .create(data.into())
            .await
            .map(TeamMemberNode::from)
            .map_err(|err| err.extend())
    }

    #[instrument(name = "graphql.update_team_member", skip(self, ctx, data))]
    async fn update_team_member(
        &self,
        ctx: &Context<'_>,
        id: i32,
        data: TeamMemberUpdateInput,
    ) -> Result<TeamMemberNode> {
        directory(ctx)?
            .update(id, data.into())
            .await
            .map(TeamMemberNode::from)
            .map_err(|err| err.extend())
    }

    #[instrument(name = "graphql.delete_team_member", skip(self, ctx))]
    async fn delete_team_member(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        directory(ctx)?
            .delete(id)
            .await
            .map(|()| true)
            .map_err(|err| err.extend())
    }

    /// Creates every member in the batch, or none when any row is invalid.
    #[instrument(name = "graphql.import_team_members", skip_all, fields(rows = members.len()))]
    async fn import_team_members(
        &self,
        ctx: &Context<'_>,
        members: Vec<TeamMemberImportInput>,
    ) -> Result<Vec<TeamMemberNode>> {
        let drafts = members.into_iter().map(Into::into).collect();
        directory(ctx)?
            .import(drafts)
            .await
            .map(|created| created.into_iter().map(TeamMemberNode::from).collect())
            .map_err(|err| err.extend())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{Request, Variables};
    use serde_json::{Value, json};

    async fn seeded_schema() -> DirectorySchema {
        build_schema(Arc::new(DirectoryData::seeded().await.unwrap()))
    }

    async fn run(schema: &DirectorySchema, query: &str, variables: Value) -> Value {
        let request = Request::new(query).variables(Variables::from_json(variables));
        serde_json::to_value(schema.execute(request).await).unwrap()
    }

    #[tokio::test]
    async fn health_query_returns_ok() {
        let schema = seeded_schema().await;
        let body = run(&schema, "{ health { ok members } }", json!({})).await;
        assert_eq!(body["data"], json!({"health": {"ok": true, "members": 5}}));
    }

    #[tokio::test]
    async fn lists_reference_collections() {
        let schema = seeded_schema().await;
        let body = run(
            &schema,
            "{ departments { id name } locations { name } teamMember(id: 2) { firstName managerId } }",
            json!({}),
        )
        .await;
        assert_eq!(body["data"]["departments"][1], json!({"id": 2, "name": "Research"}));
        assert_eq!(body["data"]["locations"].as_array().unwrap().len(), 3);
        assert_eq!(
            body["data"]["teamMember"],
            json!({"firstName": "Grace", "managerId": 1})
        );
    }

    #[tokio::test]
    async fn create_then_clear_manager_with_explicit_null() {
        let schema = seeded_schema().await;
        let created = run(
            &schema,
            "mutation($data: TeamMemberInput!) { createTeamMember(data: $data) { id department managerId } }",
            json!({"data": {"firstName": "Hedy", "lastName": "Lamarr", "departmentId": 2, "managerId": 3}}),
        )
        .await;
        assert_eq!(
            created["data"]["createTeamMember"],
            json!({"id": 6, "department": "Research", "managerId": 3})
        );

        let updated = run(
            &schema,
            "mutation($data: TeamMemberUpdateInput!) { updateTeamMember(id: 6, data: $data) { position departmentId managerId } }",
            json!({"data": {"position": "Inventor", "managerId": null}}),
        )
        .await;
        assert_eq!(
            updated["data"]["updateTeamMember"],
            json!({"position": "Inventor", "departmentId": 2, "managerId": null})
        );
    }

    #[tokio::test]
    async fn unknown_member_reports_not_found_code() {
        let schema = seeded_schema().await;
        let body = run(&schema, "mutation { deleteTeamMember(id: 404) }", json!({})).await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "NOT_FOUND");
        assert_eq!(body["errors"][0]["message"], "team member 404 not found");
    }

    #[tokio::test]
    async fn invalid_import_creates_nothing() {
        let schema = seeded_schema().await;
        let body = run(
            &schema,
            "mutation($members: [TeamMemberImportInput!]!) { importTeamMembers(members: $members) { id } }",
            json!({"members": [{"firstName": "Ok", "lastName": "Row"}, {"firstName": "No surname"}]}),
        )
        .await;
        assert_eq!(body["errors"][0]["extensions"]["code"], "INVALID_INPUT");
        let members = run(&schema, "{ teamMembers { id } }", json!({})).await;
        assert_eq!(members["data"]["teamMembers"].as_array().unwrap().len(), 5);
    }
}
