use anyhow::Result;
use platform_api::ErrorCode;
use products_directory::{
    Collection, DirectoryError, DirectoryService, GraphqlRemote, NewTeamMember, RemoteError,
    SyncOptions, TeamMemberPatch,
};
use directory_tests::{TestServer, closed_endpoint};

async fn connect(server: &TestServer) -> Result<DirectoryService<GraphqlRemote>> {
    Ok(DirectoryService::connect(server.remote()?, SyncOptions::default()).await)
}

fn hedy() -> NewTeamMember {
    NewTeamMember {
        first_name: "Hedy".into(),
        last_name: "Lamarr".into(),
        email: "hedy@example.test".into(),
        position: "Inventor".into(),
        department_id: Some(2),
        manager_id: Some(3),
        ..Default::default()
    }
}

fn rejection_code(err: &DirectoryError) -> Option<&ErrorCode> {
    match err {
        DirectoryError::Remote(remote) => remote.code(),
        _ => None,
    }
}

#[tokio::test]
async fn initial_load_reads_all_collections() -> Result<()> {
    let server = TestServer::start().await?;
    let service = connect(&server).await?;
    let snapshot = service.snapshot()?;

    assert_eq!(service.error()?, None);
    assert_eq!(snapshot.members().len(), 5);
    assert_eq!(snapshot.departments().len(), 3);
    assert_eq!(snapshot.locations().len(), 3);
    assert_eq!(
        snapshot
            .direct_reports(1)
            .iter()
            .map(|m| m.first_name.as_str())
            .collect::<Vec<_>>(),
        ["Grace", "Katherine", "Margaret"]
    );
    let chain: Vec<_> = snapshot.management_chain(4).iter().map(|m| m.id).collect();
    assert_eq!(chain, [3, 1]);
    server.stop().await
}

#[tokio::test]
async fn create_update_delete_round_trip() -> Result<()> {
    let server = TestServer::start().await?;
    let service = connect(&server).await?;

    let created = service.create_member(hedy()).await?;
    assert_eq!(created.department, "Research");
    assert!(service.snapshot()?.member(created.id).is_some());

    let patch = TeamMemberPatch {
        position: Some("Chief Inventor".into()),
        manager_id: Some(None),
        ..Default::default()
    };
    let updated = service.update_member(created.id, patch).await?;
    assert_eq!(updated.manager_id, None);
    assert_eq!(updated.department_id, Some(2));
    assert_eq!(
        service.snapshot()?.member(created.id).map(|m| m.position.clone()),
        Some("Chief Inventor".to_string())
    );

    assert!(service.delete_member(created.id).await?);
    assert!(service.snapshot()?.member(created.id).is_none());
    assert_eq!(service.snapshot()?.members().len(), 5);
    server.stop().await
}

#[tokio::test]
async fn server_rejections_carry_their_code() -> Result<()> {
    let server = TestServer::start().await?;
    let service = connect(&server).await?;

    let missing = service
        .update_member(404, TeamMemberPatch::default())
        .await
        .unwrap_err();
    assert_eq!(rejection_code(&missing), Some(&ErrorCode::NotFound));

    let invalid = service
        .create_member(NewTeamMember {
            manager_id: Some(99),
            ..hedy()
        })
        .await
        .unwrap_err();
    assert_eq!(rejection_code(&invalid), Some(&ErrorCode::InvalidInput));
    assert_eq!(service.snapshot()?.members().len(), 5);
    server.stop().await
}

#[tokio::test]
async fn csv_import_creates_parsed_rows() -> Result<()> {
    let server = TestServer::start().await?;
    let service = connect(&server).await?;

    let csv = "firstName,lastName,departmentId,managerId\n\
               Joan,Clarke,1,2\n\
               Bob,Smith,research,\n\
               Mary,Somerville,2,";
    let summary = service.import_csv(csv).await?;
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].line, 3);

    let snapshot = service.snapshot()?;
    assert_eq!(snapshot.members().len(), 7);
    let mary = snapshot
        .filter_members("somerville", "")
        .into_iter()
        .next()
        .cloned()
        .expect("imported member present");
    assert_eq!(mary.department, "Research");
    assert_eq!(mary.manager_id, None);
    server.stop().await
}

#[tokio::test]
async fn invalid_batch_is_rejected_whole() -> Result<()> {
    let server = TestServer::start().await?;
    let service = connect(&server).await?;

    let err = service
        .import_csv("firstName,lastName,managerId\nJoan,Clarke,1\nNo,Boss,99")
        .await
        .unwrap_err();
    assert!(err.is_remote());
    assert_eq!(rejection_code(&err), Some(&ErrorCode::InvalidInput));
    assert_eq!(service.snapshot()?.members().len(), 5);

    let parse = service.import_csv("firstName,,lastName\nA,B,C").await.unwrap_err();
    assert!(parse.is_parse());
    server.stop().await
}

#[tokio::test]
async fn unreachable_server_surfaces_as_error_state() -> Result<()> {
    let remote = GraphqlRemote::builder()
        .endpoint(closed_endpoint().await?)
        .build()?;
    let service = DirectoryService::connect(remote, SyncOptions::default()).await;

    assert!(matches!(service.error()?, Some(RemoteError::Transport(_))));
    assert!(service.collection_error(Collection::Locations)?.is_some());
    assert!(service.snapshot()?.members().is_empty());
    assert!(!service.is_loading()?);
    Ok(())
}
