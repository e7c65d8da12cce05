use anyhow::Result;
use clap::{Parser, Subcommand};
use shinpo::{FileStore, ProgressTracker, ResetScope};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shinpo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// User profile the progress document belongs to
    #[arg(long, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show global learning stats
    Stats,
    /// List earned achievements
    Achievements,
    /// Show progress for a learning path
    Show {
        /// Path identifier
        path_id: String,
    },
    /// Reset progress for a path, module or section
    Reset {
        /// Path identifier
        path_id: String,
        /// Module to reset (with its path intact)
        #[arg(short, long)]
        module: Option<String>,
        /// Section to reset (requires --module)
        #[arg(short, long, requires = "module")]
        section: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shinpo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let store = FileStore::open_default()?;
    let tracker = ProgressTracker::new(Box::new(store), &cli.user);

    match cli.command {
        Commands::Stats => {
            let stats = tracker.stats();
            println!("Time spent:        {} min", stats.total_time_spent);
            println!("Modules completed: {}", stats.modules_completed);
            println!("Paths completed:   {}", stats.paths_completed);
            println!("Current streak:    {} days", stats.current_streak);
            println!("Longest streak:    {} days", stats.longest_streak);
            println!("Average score:     {}", stats.average_score);
        }
        Commands::Achievements => {
            let stats = tracker.stats();
            if stats.achievements.is_empty() {
                println!("No achievements earned yet");
            }
            for achievement in &stats.achievements {
                println!("{} - {}", achievement.title, achievement.description);
            }
        }
        Commands::Show { path_id } => {
            let path = tracker.path_progress(&path_id);
            println!("{}: {}% complete, {} min", path.path_id, path.completion_percentage, path.total_time_spent);
            for module in &path.module_progress {
                println!("  {} [{:?}] {} sections", module.module_id, module.status, module.section_progress.len());
            }
        }
        Commands::Reset { path_id, module, section } => {
            let scope = match (module, section) {
                (Some(module_id), Some(section_id)) => {
                    ResetScope::Section { path_id, module_id, section_id }
                }
                (Some(module_id), None) => ResetScope::Module { path_id, module_id },
                _ => ResetScope::Path { path_id },
            };
            tracker.reset(scope);
            println!("Progress reset");
        }
    }

    Ok(())
}
