mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use platform_obs::{ObsConfig, init_tracing};
use products_directory::{
    ClientConfig, Collection, DirectoryService, GraphqlRemote, NewTeamMember, RecordId,
    TeamMemberPatch,
};
use serde::Serialize;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "teamdir", version, about = "Browse and edit the team directory")]
struct Cli {
    /// GraphQL endpoint, overriding TEAMDIR_ENDPOINT.
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    /// Log request details to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List members, optionally filtered.
    Members {
        /// Case-insensitive match on name, email or position.
        #[arg(long, default_value = "")]
        search: String,
        /// Exact department label.
        #[arg(long, default_value = "")]
        department: String,
    },
    /// Show one member.
    Member { id: RecordId },
    /// List a manager's direct reports.
    Reports { id: RecordId },
    /// Walk a member's management chain upwards.
    Chain { id: RecordId },
    Departments,
    Locations,
    /// Create a member.
    Create(CreateArgs),
    /// Change fields of an existing member.
    Update(UpdateArgs),
    /// Delete a member.
    Delete { id: RecordId },
    /// Import members from a CSV file in one batch.
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    position: String,
    #[arg(long, default_value = "")]
    department: String,
    #[arg(long)]
    department_id: Option<RecordId>,
    #[arg(long)]
    location_id: Option<RecordId>,
    #[arg(long)]
    manager_id: Option<RecordId>,
}

impl From<CreateArgs> for NewTeamMember {
    fn from(args: CreateArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            position: args.position,
            department: args.department,
            department_id: args.department_id,
            location_id: args.location_id,
            manager_id: args.manager_id,
        }
    }
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: RecordId,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long, conflicts_with = "clear_department_id")]
    department_id: Option<RecordId>,
    #[arg(long, conflicts_with = "clear_location")]
    location_id: Option<RecordId>,
    #[arg(long, conflicts_with = "clear_manager")]
    manager_id: Option<RecordId>,
    #[arg(long)]
    clear_department_id: bool,
    #[arg(long)]
    clear_location: bool,
    #[arg(long)]
    clear_manager: bool,
}

fn reference(value: Option<RecordId>, clear: bool) -> Option<Option<RecordId>> {
    if clear { Some(None) } else { value.map(Some) }
}

impl From<UpdateArgs> for TeamMemberPatch {
    fn from(args: UpdateArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            position: args.position,
            department: args.department,
            department_id: reference(args.department_id, args.clear_department_id),
            location_id: reference(args.location_id, args.clear_location),
            manager_id: reference(args.manager_id, args.clear_manager),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut obs = ObsConfig::new("teamdir").with_stderr();
    if cli.verbose {
        obs = obs.with_filter("debug,hyper=warn,reqwest=warn");
    }
    init_tracing(obs)?;

    let mut config = ClientConfig::load()?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.endpoint = endpoint;
    }
    debug!(endpoint = %config.endpoint, "connecting to directory");
    let remote = GraphqlRemote::from_config(&config)?;
    let service = DirectoryService::connect(remote, config.sync.clone()).await;

    let outcome = run(&service, cli.command, cli.json).await;
    service.close();
    outcome
}

async fn run(
    service: &DirectoryService<GraphqlRemote>,
    command: Command,
    json: bool,
) -> Result<()> {
    if let Some(err) = service.error()? {
        return Err(anyhow!(err).context("failed to load team members"));
    }
    let snapshot = service.snapshot()?;
    match command {
        Command::Members { search, department } => {
            let members = snapshot.filter_members(&search, &department);
            emit(json, &members, || render::member_table(&members))
        }
        Command::Member { id } => {
            let member = snapshot
                .member(id)
                .ok_or_else(|| anyhow!("team member {id} not found"))?;
            emit(json, member, || render::member_detail(&snapshot, member))
        }
        Command::Reports { id } => {
            let reports = snapshot.direct_reports(id);
            emit(json, &reports, || render::member_table(&reports))
        }
        Command::Chain { id } => {
            let member = snapshot
                .member(id)
                .ok_or_else(|| anyhow!("team member {id} not found"))?;
            let managers = snapshot.management_chain(id);
            emit(json, &managers, || render::chain(member, &managers))
        }
        Command::Departments => {
            check_collection(service, Collection::Departments)?;
            let departments = snapshot.departments();
            emit(json, departments, || {
                render::named(departments.iter().map(|d| (d.id, d.name.as_str())))
            })
        }
        Command::Locations => {
            check_collection(service, Collection::Locations)?;
            let locations = snapshot.locations();
            emit(json, locations, || {
                render::named(locations.iter().map(|l| (l.id, l.name.as_str())))
            })
        }
        Command::Create(args) => {
            let created = service.create_member(args.into()).await?;
            emit(json, &created, || format!("created {}", render::member_line(&created)))
        }
        Command::Update(args) => {
            let id = args.id;
            let patch = TeamMemberPatch::from(args);
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let updated = service.update_member(id, patch).await?;
            emit(json, &updated, || format!("updated {}", render::member_line(&updated)))
        }
        Command::Delete { id } => {
            let removed = service.delete_member(id).await?;
            emit(json, &removed, || format!("deleted team member {id}"))
        }
        Command::Import { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = service.import_csv(&text).await?;
            emit(json, &summary, || render::import_summary(&summary))
        }
    }
}

fn check_collection(
    service: &DirectoryService<GraphqlRemote>,
    collection: Collection,
) -> Result<()> {
    match service.collection_error(collection)? {
        Some(err) => Err(anyhow!(err).context(format!("failed to load {collection}"))),
        None => Ok(()),
    }
}

fn emit<T, F>(json: bool, value: &T, text: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}
