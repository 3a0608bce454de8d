use anyhow::Result;
use cbrate::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount, e.g. `cbrate convert 100 usd`
    Convert {
        /// Amount followed by a currency code or name
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
        /// Ignore cached rates and fetch them again
        #[arg(short, long)]
        refresh: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display the current rate table
    Rates {
        /// Ignore cached rates and fetch them again
        #[arg(short, long)]
        refresh: bool,
    },
    /// Convert amounts read line by line from stdin
    Interactive,
}

impl From<Commands> for cbrate::AppCommand {
    fn from(cmd: Commands) -> cbrate::AppCommand {
        match cmd {
            Commands::Convert {
                text,
                refresh,
                json,
            } => cbrate::AppCommand::Convert {
                text: text.join(" "),
                refresh,
                json,
            },
            Commands::Rates { refresh } => cbrate::AppCommand::Rates { refresh },
            Commands::Interactive => cbrate::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cbrate::cli::setup::setup(),
        Some(cmd) => cbrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
