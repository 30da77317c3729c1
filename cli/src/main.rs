//! Command-line client for the deal-pipeline backend.
//!
//! Drives the `pipeline` session library with a file-backed token slot, so a
//! `login` persists across invocations until `logout` or a failed refresh.
//! Results print as pretty JSON on stdout; logs go to stderr under
//! `RUST_LOG`.

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use pipeline::auth::session::DEFAULT_REFRESH_THRESHOLD_SECS;
use pipeline::config::{DEFAULT_API_URL, DEFAULT_TOKEN_FILE};
use pipeline::net::models::{Deal, DealEdit, DealFilters, DealStage, DealType, NewDeal, NewUser};
use pipeline::{ApiError, ClientConfig, Credentials, LoginFailure, Navigator, Route, SessionContext};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}", .0.message())]
    Login(LoginFailure),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not signed in; run `pipeline-cli login` first")]
    NotSignedIn,
    #[error("note {note_id} not found on deal {deal_id}")]
    NoteNotFound { deal_id: String, note_id: String },
    #[error("not permitted: {0}")]
    NotPermitted(&'static str),
    #[error("pass --username or --email")]
    MissingLookup,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pipeline-cli", about = "Deal pipeline API client")]
struct Cli {
    #[arg(long, env = "PIPELINE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "PIPELINE_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    #[arg(long, env = "PIPELINE_REFRESH_THRESHOLD_SECS", default_value_t = DEFAULT_REFRESH_THRESHOLD_SECS)]
    refresh_threshold_secs: i64,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            refresh_threshold_secs: self.refresh_threshold_secs.max(0),
            token_file: self.token_file.clone(),
            ..ClientConfig::default()
        }
        .with_api_url(&self.api_url)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a token and store it.
    Login {
        username: String,
        #[arg(long, env = "PIPELINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Refresh,
    /// Show what the stored token says, without calling the server.
    Status,
    Whoami,
    /// Resolve a client route through the guards.
    Route {
        path: String,
    },
    Deals(DealsCommand),
    Notes(NotesCommand),
    Users(UsersCommand),
}

#[derive(Args, Debug)]
struct DealsCommand {
    #[command(subcommand)]
    command: DealsSubcommand,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    stage: Option<DealStage>,
    #[arg(long)]
    sector: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long, default_value_t = pipeline::net::models::DEFAULT_PAGE_SIZE)]
    size: u32,
}

impl FilterArgs {
    fn into_filters(self) -> DealFilters {
        DealFilters {
            stage: self.stage.map(|s| s.as_str().to_owned()),
            sector: self.sector,
            page: self.page,
            size: Some(self.size),
        }
    }
}

#[derive(Subcommand, Debug)]
enum DealsSubcommand {
    List(FilterArgs),
    Mine(FilterArgs),
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        sector: String,
        #[arg(long)]
        deal_type: DealType,
        #[arg(long, help = "Deal value (admins only)")]
        value: Option<f64>,
    },
    /// Patch only the fields that differ from the current deal.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        sector: Option<String>,
        #[arg(long)]
        deal_type: Option<DealType>,
        #[arg(long)]
        stage: Option<DealStage>,
        #[arg(long, help = "Deal value (admins only)")]
        value: Option<f64>,
    },
    SetValue {
        id: String,
        value: f64,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct NotesCommand {
    #[command(subcommand)]
    command: NotesSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotesSubcommand {
    Add { deal_id: String, text: String },
    Delete { deal_id: String, note_id: String },
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List,
    Get {
        #[arg(long, conflicts_with = "email")]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Create {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, env = "PIPELINE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Promote {
        username: String,
    },
    Status {
        username: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    Delete {
        username: String,
    },
    ResetPassword {
        username: String,
        #[arg(long, env = "PIPELINE_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Guard redirects have no page to show in a terminal; they are logged.
#[derive(Debug, Default)]
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate(&self, route: &Route) {
        tracing::info!(route = %route, "navigate");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = SessionContext::native(cli.config(), Arc::new(CliNavigator))?;

    match cli.command {
        Command::Login { username, password } => run_login(&ctx, username, password).await,
        Command::Logout => {
            ctx.gateway().logout().await?;
            print_json(&json!({ "loggedOut": true }))
        }
        Command::Refresh => {
            ctx.gateway().refresh().await?;
            print_status(&ctx)
        }
        Command::Status => print_status(&ctx),
        Command::Whoami => print_json(&ctx.client().current_user().await?),
        Command::Route { path } => {
            let route = ctx.router().navigate(&path);
            print_json(&json!({ "requested": path, "entered": route.path() }))
        }
        Command::Deals(deals) => run_deals(&ctx, deals).await,
        Command::Notes(notes) => run_notes(&ctx, notes).await,
        Command::Users(users) => run_users(&ctx, users).await,
    }
}

async fn run_login(ctx: &SessionContext, username: String, password: String) -> Result<(), CliError> {
    match ctx.gateway().login(&Credentials::new(username, password)).await {
        Ok(()) => print_status(ctx),
        Err(e) => {
            tracing::debug!(error = %e, "login rejected");
            let failure = LoginFailure::classify(&e);
            eprintln!("{}", failure.message());
            Err(CliError::Login(failure))
        }
    }
}

fn status_json(ctx: &SessionContext) -> serde_json::Value {
    let oracle = ctx.oracle();
    json!({
        "loggedIn": oracle.is_logged_in(),
        "phase": format!("{:?}", ctx.gateway().phase()),
        "userId": oracle.user_id(),
        "role": oracle.role().to_string(),
        "expiresAt": oracle.expiration_time(),
        "secondsRemaining": oracle.seconds_remaining(),
        "expiringSoon": ctx.store().has_token() && oracle.is_expiring_soon(),
    })
}

fn print_status(ctx: &SessionContext) -> Result<(), CliError> {
    print_json(&status_json(ctx))
}

fn require_session(ctx: &SessionContext) -> Result<(), CliError> {
    if ctx.store().has_token() { Ok(()) } else { Err(CliError::NotSignedIn) }
}

async fn run_deals(ctx: &SessionContext, deals: DealsCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let api = ctx.client();
    match deals.command {
        DealsSubcommand::List(filters) => print_json(&api.list_deals(&filters.into_filters()).await?),
        DealsSubcommand::Mine(filters) => print_json(&api.list_my_deals(&filters.into_filters()).await?),
        DealsSubcommand::Get { id } => print_json(&api.get_deal(&id).await?),
        DealsSubcommand::Create { title, sector, deal_type, value } => {
            let viewer = ctx.oracle().viewer();
            if value.is_some() && !viewer.is_admin() {
                tracing::warn!("deal value ignored for non-admin");
            }
            let deal = NewDeal::new(title, sector, deal_type).with_value(value, &viewer);
            print_json(&api.create_deal(&deal).await?)
        }
        DealsSubcommand::Update { id, title, sector, deal_type, stage, value } => {
            let original = api.get_deal(&id).await?;
            let viewer = ctx.oracle().viewer();
            if !original.can_edit(&viewer) {
                return Err(CliError::NotPermitted("only the owner or an admin can edit this deal"));
            }
            let edited = Deal {
                title: title.unwrap_or_else(|| original.title.clone()),
                sector: sector.unwrap_or_else(|| original.sector.clone()),
                deal_type: deal_type.map_or_else(|| original.deal_type.clone(), |t| t.as_str().to_owned()),
                stage: stage.map_or_else(|| original.stage.clone(), |s| s.as_str().to_owned()),
                deal_value: value.or(original.deal_value),
                ..original.clone()
            };
            let edit = DealEdit::plan(&original, &edited, viewer.is_admin());
            api.save_deal_edit(&id, &edit).await?;
            print_json(&api.get_deal(&id).await?)
        }
        DealsSubcommand::SetValue { id, value } => {
            api.update_deal_value(&id, value).await?;
            print_json(&api.get_deal(&id).await?)
        }
        DealsSubcommand::Delete { id } => {
            api.delete_deal(&id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

async fn run_notes(ctx: &SessionContext, notes: NotesCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let api = ctx.client();
    match notes.command {
        NotesSubcommand::Add { deal_id, text } => print_json(&api.add_note(&deal_id, text.trim()).await?),
        NotesSubcommand::Delete { deal_id, note_id } => {
            let deal = api.get_deal(&deal_id).await?;
            let Some(note) = deal.notes.iter().find(|n| n.note_id == note_id) else {
                return Err(CliError::NoteNotFound { deal_id, note_id });
            };
            if !note.can_delete(&ctx.oracle().viewer()) {
                return Err(CliError::NotPermitted("only an admin or the note author can delete this note"));
            }
            print_json(&api.delete_note(&deal_id, &note_id).await?)
        }
    }
}

async fn run_users(ctx: &SessionContext, users: UsersCommand) -> Result<(), CliError> {
    require_session(ctx)?;
    let api = ctx.client();
    match users.command {
        UsersSubcommand::List => print_json(&api.list_users().await?),
        UsersSubcommand::Get { username, email } => match (username, email) {
            (Some(username), _) => print_json(&api.get_user_by_username(&username).await?),
            (None, Some(email)) => print_json(&api.get_user_by_email(&email).await?),
            (None, None) => Err(CliError::MissingLookup),
        },
        UsersSubcommand::Create { username, email, password } => {
            let user = NewUser::new(username, email, password);
            match api.create_user(&user).await {
                Ok(()) => print_json(&json!({ "created": user.username })),
                Err(e) if e.is_conflict() => {
                    Err(CliError::Api(ApiError::Rejected { status: 409, message: "username or email already exists".into() }))
                }
                Err(e) => Err(e.into()),
            }
        }
        UsersSubcommand::Promote { username } => {
            api.promote_to_admin(&username).await?;
            print_json(&json!({ "promoted": username }))
        }
        UsersSubcommand::Status { username, active } => {
            api.update_user_status(&username, active).await?;
            print_json(&json!({ "username": username, "active": active }))
        }
        UsersSubcommand::Delete { username } => {
            api.delete_user(&username).await?;
            print_json(&json!({ "deleted": username }))
        }
        UsersSubcommand::ResetPassword { username, password } => {
            api.reset_user_password(&username, &password).await?;
            print_json(&json!({ "passwordReset": username }))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
