use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use medbrief::config::parse_base_url;
use medbrief::router::Location;
use medbrief::types::BriefOptions;
use medbrief::{AppContext, ClientConfig, ClientError, RouterError};
use serde::Serialize;
use serde_json::json;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{0}")]
    Router(#[from] RouterError),
    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "medbrief", about = "MedBrief journal briefs from the command line")]
struct Cli {
    #[arg(long, env = "MEDBRIEF_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "MEDBRIEF_STATE_DIR", help = "Directory holding the saved session token")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is up.
    Ping,
    Login(CredentialArgs),
    Register(CredentialArgs),
    Logout,
    /// Show whether a session token is saved.
    Status,
    Journals(JournalsCommand),
    Profiles(ProfilesCommand),
    Brief(BriefArgs),
    /// Resolve a client route through the auth guard.
    Open {
        path: String,
    },
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "MEDBRIEF_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct JournalsCommand {
    #[command(subcommand)]
    command: JournalsSubcommand,
}

#[derive(Subcommand, Debug)]
enum JournalsSubcommand {
    Search {
        query: String,
    },
    Presets {
        #[arg(help = "Preset category, e.g. cardiology or medicine")]
        category: String,
    },
    Get {
        ids: Vec<i64>,
    },
}

#[derive(Args, Debug)]
struct ProfilesCommand {
    #[command(subcommand)]
    command: ProfilesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfilesSubcommand {
    List,
    Create {
        #[arg(long, default_value = "My Brief")]
        name: String,
        #[arg(long = "journal", value_delimiter = ',')]
        journal_ids: Vec<i64>,
    },
    Update {
        profile_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long = "journal", value_delimiter = ',')]
        journal_ids: Vec<i64>,
    },
    Delete {
        profile_id: i64,
    },
}

#[derive(Args, Debug)]
struct BriefArgs {
    profile_id: i64,

    #[arg(long, default_value_t = medbrief::types::DEFAULT_BRIEF_DAYS, conflicts_with_all = ["from", "to"])]
    days: u32,

    #[arg(long, requires = "to", help = "Start date, YYYY-MM-DD")]
    from: Option<String>,

    #[arg(long, requires = "from", help = "End date, YYYY-MM-DD")]
    to: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, ".env could not be loaded");
        }
    }

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let mut app = AppContext::from_config(&config)?;

    match cli.command {
        Command::Ping => {
            let health = app.api.health().await?;
            println!("{}", health.status);
            Ok(())
        }
        Command::Login(args) => {
            app.session.login(&args.email, &args.password).await?;
            eprintln!("logged in as {}", args.email);
            Ok(())
        }
        Command::Register(args) => {
            app.session.register(&args.email, &args.password).await?;
            eprintln!("registered and logged in as {}", args.email);
            Ok(())
        }
        Command::Logout => {
            app.session.logout();
            eprintln!("logged out");
            Ok(())
        }
        Command::Status => print_json(&json!({
            "authenticated": app.session.is_authenticated(),
            "base_url": config.base_url.as_str(),
            "state_dir": config.state_dir,
        })),
        Command::Journals(journals) => run_journals(&app, journals).await,
        Command::Profiles(profiles) => run_profiles(&app, profiles).await,
        Command::Brief(args) => run_brief(&app, args).await,
        Command::Open { path } => run_open(&mut app, &path),
    }
}

fn build_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    apply_overrides(cli, ClientConfig::from_env()?)
}

fn apply_overrides(cli: &Cli, mut config: ClientConfig) -> Result<ClientConfig, CliError> {
    if let Some(raw) = &cli.base_url {
        config.base_url = parse_base_url(raw)?;
    }
    if let Some(dir) = &cli.state_dir {
        config.state_dir.clone_from(dir);
    }
    Ok(config)
}

async fn run_journals(app: &AppContext, journals: JournalsCommand) -> Result<(), CliError> {
    let found = match journals.command {
        JournalsSubcommand::Search { query } => app.api.search_journals(&query).await?,
        JournalsSubcommand::Presets { category } => app.api.get_preset_journals(&category).await?,
        JournalsSubcommand::Get { ids } => app.api.get_journals_by_ids(Some(ids.as_slice())).await?,
    };
    print_json(&found)
}

async fn run_profiles(app: &AppContext, profiles: ProfilesCommand) -> Result<(), CliError> {
    match profiles.command {
        ProfilesSubcommand::List => print_json(&app.api.get_profiles().await?),
        ProfilesSubcommand::Create { name, journal_ids } => {
            print_json(&app.api.create_profile(&name, &journal_ids).await?)
        }
        ProfilesSubcommand::Update {
            profile_id,
            name,
            journal_ids,
        } => print_json(&app.api.update_profile(profile_id, &name, &journal_ids).await?),
        ProfilesSubcommand::Delete { profile_id } => print_json(&app.api.delete_profile(profile_id).await?),
    }
}

async fn run_brief(app: &AppContext, args: BriefArgs) -> Result<(), CliError> {
    let options = BriefOptions { days: args.days, from_date: args.from, to_date: args.to };
    let articles = app.api.generate_brief(args.profile_id, &options).await?;
    eprintln!("{} articles", articles.len());
    print_json(&articles)
}

fn run_open(app: &mut AppContext, path: &str) -> Result<(), CliError> {
    let navigation = app.router.navigate(path)?;
    let Location { route, path, params, query } = navigation.location;
    print_json(&json!({
        "view": format!("{:?}", route.view),
        "name": route.name,
        "path": path,
        "params": params,
        "query": query,
        "redirected_from": navigation.redirected_from,
    }))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
