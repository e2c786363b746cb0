use clap::{Parser, Subcommand};
use records_core::config::path_from_env_value;
use records_core::{
    ConfirmationGate, CoreConfig, DeleteOutcome, FilePreferenceStore, FileStore,
    NavigationShell, PatientDetailsScreen, Record, RecordId, Route, Screen,
};
use serde_json::Value;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod console;

use console::{decision_from_answer, ConsoleNavigator, ConsoleNotifier, LocalSession};

#[derive(Parser)]
#[command(name = "records")]
#[command(about = "Patient records terminal client")]
struct Cli {
    /// Patient data directory (defaults to PATIENT_DATA_DIR, then "patient_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a patient's details
    Show {
        /// Patient record id
        id: String,
    },
    /// Delete a patient record after confirmation
    Delete {
        /// Patient record id
        id: String,
    },
    /// Import records from a JSON object mapping record ids to fields
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// List stored record ids
    List,
    /// Show the navigation menu
    Menu {
        /// Dismiss the first-login tooltip
        #[arg(long)]
        dismiss_tooltip: bool,
    },
    /// Sign out of the current session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("records=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .or_else(|| path_from_env_value(std::env::var("PATIENT_DATA_DIR").ok()))
        .unwrap_or_else(|| PathBuf::from(records_core::DEFAULT_PATIENT_DATA_DIR));
    let cfg = CoreConfig::new(
        data_dir,
        path_from_env_value(std::env::var("RECORDS_PREFERENCES_FILE").ok()),
    )?;
    let store = FileStore::from_config(&cfg);

    match cli.command {
        Some(Commands::Show { id }) => {
            let screen = details_screen(&store, &id, ConfirmationGate::new())?;
            screen.mount().await;
            print_screen(&screen.render());
        }
        Some(Commands::Delete { id }) => {
            let gate = ConfirmationGate::new();
            let screen = Arc::new(details_screen(&store, &id, gate.clone())?);
            screen.mount().await;
            print_screen(&screen.render());

            let outcome = run_delete(screen, &gate).await?;
            match outcome {
                DeleteOutcome::Deleted => {}
                DeleteOutcome::Cancelled => println!("Deletion cancelled."),
                DeleteOutcome::Failed(e) => anyhow::bail!("delete failed: {e}"),
                DeleteOutcome::Ignored(reason) => println!("Nothing to delete ({reason:?})."),
            }
        }
        Some(Commands::Import { file }) => {
            let contents = std::fs::read_to_string(&file)?;
            let Value::Object(documents) = serde_json::from_str::<Value>(&contents)? else {
                anyhow::bail!("{} must contain a JSON object of records", file.display());
            };
            let mut imported = 0usize;
            for (raw_id, fields) in documents {
                let Value::Object(fields) = fields else {
                    anyhow::bail!("record {raw_id} is not a JSON object");
                };
                let record = Record::new(RecordId::parse(&raw_id)?, fields);
                store.put(&record).await?;
                imported += 1;
            }
            println!("Imported {imported} record(s) into {}", store.root().display());
        }
        Some(Commands::List) => {
            let ids = store.list_ids().await?;
            if ids.is_empty() {
                println!("No patients found.");
            }
            for id in ids {
                println!("{id}");
            }
        }
        Some(Commands::Menu { dismiss_tooltip }) => {
            let shell = shell(&cfg, Route::Home);
            if dismiss_tooltip {
                shell.dismiss_tooltip()?;
            }
            let view = shell.render();
            if let Some(email) = &view.user_email {
                println!("Signed in as {email}");
            }
            for item in &view.menu {
                let marker = if item.active { "*" } else { " " };
                println!("{marker} {:<16} {}", item.label, item.route);
            }
            if let Some(tooltip) = view.tooltip {
                println!("\n{tooltip} (run with --dismiss-tooltip to hide)");
            }
        }
        Some(Commands::Logout) => {
            if !shell(&cfg, Route::Home).logout().await {
                anyhow::bail!("logout failed");
            }
        }
        None => {
            println!("Use 'records --help' for commands");
        }
    }

    Ok(())
}

fn details_screen(
    store: &FileStore,
    raw_id: &str,
    gate: ConfirmationGate,
) -> anyhow::Result<PatientDetailsScreen> {
    Ok(PatientDetailsScreen::new(
        RecordId::parse(raw_id)?,
        Arc::new(store.clone()),
        gate,
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleNavigator),
    ))
}

fn shell(cfg: &CoreConfig, current: Route) -> NavigationShell {
    NavigationShell::mount(
        Arc::new(LocalSession::from_email(
            std::env::var("RECORDS_USER_EMAIL").ok(),
        )),
        Arc::new(FilePreferenceStore::new(cfg.preferences_file())),
        Arc::new(ConsoleNotifier),
        Arc::new(ConsoleNavigator),
        current,
    )
}

/// Presses Delete and answers the prompt from stdin.
async fn run_delete(
    screen: Arc<PatientDetailsScreen>,
    gate: &ConfirmationGate,
) -> anyhow::Result<DeleteOutcome> {
    let mut prompts = gate.subscribe();
    let mut task = tokio::spawn(async move { screen.delete().await });

    let prompt = tokio::select! {
        finished = &mut task => return Ok(finished?),
        changed = prompts.wait_for(Option::is_some) => changed?.clone(),
    };

    if let Some(prompt) = prompt {
        println!("\n{}", records_core::constants::DELETE_PROMPT_TITLE);
        println!("{}", prompt.message);
        print!("Delete? [y/N] ");
        std::io::stdout().flush()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let answer = lines.next_line().await?;
        gate.resolve(prompt.id, decision_from_answer(answer.as_deref()));
    }

    Ok(task.await?)
}

fn print_screen(screen: &Screen) {
    match screen {
        Screen::Loading { message } | Screen::NotFound { message } => println!("{message}"),
        Screen::Loaded { details } => {
            println!("Patient Details");
            for row in details.rows() {
                println!("  {:<18} {}", format!("{}:", row.label), row.value);
            }
        }
    }
}
