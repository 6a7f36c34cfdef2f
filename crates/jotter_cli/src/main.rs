//! Terminal front end for the jotter notes service.
//!
//! # Responsibility
//! - Parse commands, dispatch store operations, render store state.
//! - Keep no business state of its own; everything lives in `JotterApp`.

use clap::{Parser, Subcommand};
use jotter_core::{
    default_log_level, init_logging, ClientConfig, HttpApiClient, JotterApp, MemoryTokenStore,
    Note, RefreshPolicy, StoreError,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const LOG_DIR_NAME: &str = "jotter-logs";

type App = JotterApp<HttpApiClient>;

#[derive(Parser)]
#[command(name = "jotter")]
#[command(author, version, about = "Terminal client for the jotter notes service")]
#[command(propagate_version = true)]
struct Cli {
    /// API base URL (overrides JOTTER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// SQLite file holding the session token (overrides JOTTER_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Keep the session in memory only. Every run starts signed out, so
    /// commands that need a stored session refuse this flag
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Re-fetch the note list after every create, update or delete
    #[arg(long, global = true)]
    refetch: bool,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Account password (or set JOTTER_PASSWORD)
        #[arg(long, env = "JOTTER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and remember the session
    Signin {
        #[arg(long)]
        email: String,
        /// Account password (or set JOTTER_PASSWORD)
        #[arg(long, env = "JOTTER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Signout,
    /// Show the account behind the stored session
    Whoami,
    /// Check that the API is reachable
    Health,
    /// Work with notes
    #[command(subcommand)]
    Notes(NotesCommand),
}

#[derive(Subcommand)]
enum NotesCommand {
    /// List all notes
    List,
    /// Show one note in full
    Show { id: String },
    /// Create a note
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Replace a note's title and content
    Update {
        id: String,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        content: String,
    },
    /// Delete a note
    Delete { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(message) = start_logging(&cli) {
        eprintln!("warning: logging disabled: {message}");
    }

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    if cli.ephemeral {
        if let Err(message) = check_ephemeral(&cli.command) {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    }

    let app = match build_app(&config, cli.ephemeral) {
        Ok(app) => app,
        Err(message) => {
            eprintln!("Error: {message}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(cli.command, &app).await;
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(cli: &Cli) -> Result<(), String> {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join(LOG_DIR_NAME));
    let dir = dir
        .to_str()
        .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", dir.display()))?
        .to_string();
    init_logging(&level, &dir, false).map_err(|err| err.to_string())
}

/// Rejects commands that only make sense with a session kept across runs.
fn check_ephemeral(command: &Commands) -> Result<(), String> {
    let name = match command {
        Commands::Whoami => "whoami",
        Commands::Notes(_) => "notes",
        Commands::Signup { .. } | Commands::Signin { .. } | Commands::Signout | Commands::Health => {
            return Ok(())
        }
    };
    Err(format!(
        "`{name}` needs a stored session, which --ephemeral never keeps; sign in without it"
    ))
}

fn build_app(config: &ClientConfig, ephemeral: bool) -> Result<App, String> {
    if !ephemeral {
        return JotterApp::from_config(config).map_err(|err| err.to_string());
    }
    let api = HttpApiClient::new(config).map_err(|err| err.to_string())?;
    Ok(JotterApp::new(
        api,
        Arc::new(MemoryTokenStore::new()),
        config.refresh_policy(),
    ))
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, String> {
    let mut builder = ClientConfig::from_env()
        .map_err(|err| err.to_string())?
        .into_builder();
    if let Some(url) = &cli.api_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(path) = &cli.db_path {
        builder = builder.token_db_path(path.clone());
    }
    if cli.refetch {
        builder = builder.refresh_policy(RefreshPolicy::RefetchAfterWrite);
    }
    builder.build().map_err(|err| err.to_string())
}

async fn run(command: Commands, app: &App) -> Result<(), String> {
    info!("event=cli_command module=app status=start");
    match command {
        Commands::Signup {
            name,
            email,
            password,
        } => {
            app.session()
                .sign_up(&name, &email, &password)
                .await
                .map_err(into_message)?;
            println!("Account created. Sign in with `jotter signin`.");
        }
        Commands::Signin { email, password } => {
            let user = app
                .session()
                .sign_in(&email, &password)
                .await
                .map_err(into_message)?;
            println!("Signed in as {} <{}>", user.display_name, user.email);
        }
        Commands::Signout => {
            app.sign_out();
            println!("Signed out.");
        }
        Commands::Whoami => match app.session().restore_and_validate().await {
            Ok(Some(user)) => println!("{} <{}> ({})", user.display_name, user.email, user.id),
            Ok(None) => println!("Not signed in."),
            Err(err) => return Err(into_message(err)),
        },
        Commands::Health => {
            let api = app.api();
            let status = api.health().await.map_err(|err| err.to_string())?;
            println!("{} is {status}", api.base_url());
        }
        Commands::Notes(notes_command) => {
            app.session().restore_session();
            run_notes(notes_command, app).await?;
        }
    }
    Ok(())
}

async fn run_notes(command: NotesCommand, app: &App) -> Result<(), String> {
    let notes = app.notes();
    match command {
        NotesCommand::List => {
            notes.fetch_notes().await.map_err(into_message)?;
            let state = notes.state();
            if state.notes.is_empty() {
                println!("No notes yet.");
            }
            for note in &state.notes {
                print_summary(note);
            }
        }
        NotesCommand::Show { id } => {
            let note = notes.load_note(&id).await.map_err(into_message)?;
            print_summary(&note);
            println!();
            println!("{}", note.content);
        }
        NotesCommand::Create { title, content } => {
            notes
                .create_note(&title, &content)
                .await
                .map_err(into_message)?;
            println!("Note created.");
            print_refreshed(app);
        }
        NotesCommand::Update { id, title, content } => {
            notes
                .update_note(&id, &title, &content)
                .await
                .map_err(into_message)?;
            println!("Note {id} updated.");
            print_refreshed(app);
        }
        NotesCommand::Delete { id } => {
            notes.delete_note(&id).await.map_err(into_message)?;
            println!("Note {id} deleted.");
            print_refreshed(app);
        }
    }
    Ok(())
}

fn print_refreshed(app: &App) {
    if app.notes().policy() != RefreshPolicy::RefetchAfterWrite {
        return;
    }
    let state = app.notes().state();
    if let Some(error) = state.error {
        eprintln!("warning: {error}");
        return;
    }
    for note in &state.notes {
        print_summary(note);
    }
}

fn print_summary(note: &Note) {
    println!(
        "{}  {}  {}",
        note.id,
        note.updated_at.format("%Y-%m-%d %H:%M"),
        note.title
    );
}

fn into_message(err: StoreError) -> String {
    err.message().to_string()
}
