mod app;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hobbi_core::AppError;
use hobbi_store::SyncError;

use app::{App, Dashboard};

#[derive(Parser, Debug)]
#[command(name = "hobbi", version, about = "Personal goals dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Load the dashboard and print it (default).
    Show,

    /// Save the loaded dashboard to the remote store.
    Save,

    /// Write goals to goals-YYYY-MM-DD.json.
    Export {
        /// Directory to write into.
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Replace goals with the contents of a file.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    hobbi_core::init()?;

    let app = App::new()?;
    tracing::info!("Hobbi started");
    let mut dashboard = app.start().await;

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => print_dashboard(&app, &dashboard),
        Command::Save => match app.save(&dashboard.state).await {
            Ok(saved) => {
                if let Some(at) = saved.last_updated {
                    println!("Saved at {}", at.with_timezone(&chrono::Local).format("%H:%M:%S"));
                }
            }
            Err(e) => report(e),
        },
        Command::Export { dir } => match app.export(&dashboard.state, &dir) {
            Ok(path) => println!("Exported {} goals to {}", dashboard.state.goals.len(), path.display()),
            Err(e) => report(e),
        },
        Command::Import { file, yes } => {
            let confirm = |prompt: &str| yes || ask(prompt);
            match app.import(&mut dashboard.state, &file, confirm).await {
                Ok(true) => println!("Imported {} goals", dashboard.state.goals.len()),
                Ok(false) => println!("Import cancelled"),
                Err(e) => report(e),
            }
        }
    }

    Ok(())
}

fn print_dashboard(app: &App, dashboard: &Dashboard) {
    println!("Hobbi - Personal Goals Dashboard");
    println!("  Data: {:?}", dashboard.source);
    match &dashboard.weather.reading {
        Some(reading) => println!("  Weather: {}", reading),
        None => println!("  Weather: loading"),
    }

    println!("\nGoals:");
    for goal in &dashboard.state.goals {
        println!(
            "  {} {:<28} {:>6.1}%  ({} / {} {})",
            goal.icon,
            goal.title,
            goal.progress_percent(),
            goal.current,
            goal.target,
            goal.unit
        );
    }

    for (label, items) in [("Favorites", &dashboard.state.favorites), ("Apps", &dashboard.state.apps)] {
        if items.is_empty() {
            continue;
        }
        println!("\n{}:", label);
        for item in items {
            println!("  {} {} - {}", item.icon, item.title, item.url);
        }
    }

    tracing::debug!("Config directory: {}", app.config().config_dir.display());
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

fn report(error: SyncError) {
    tracing::error!("{}", error);
    if error.is_user_facing() {
        eprintln!("{}", error.user_message());
    } else {
        eprintln!("{}", AppError::from(error).user_message());
    }
}
