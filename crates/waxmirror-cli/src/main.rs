use clap::{ArgAction, Parser, Subcommand};
use commands::{config, sync};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "waxmirror")]
#[command(about = "Waxmirror - Mirror your Discogs collection and wantlist into Notion")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the Notion mirror from Discogs
    #[command(
        long_about = "Fetch the Discogs collection and wantlist, archive every page currently in the Notion database, and recreate pages from the freshly fetched releases. With no list flags, both lists are synced according to the configuration."
    )]
    Sync {
        /// Sync the collection only
        #[arg(long, action = ArgAction::SetTrue)]
        collection: bool,

        /// Sync the wantlist only
        #[arg(long, action = ArgAction::SetTrue)]
        wantlist: bool,

        /// Override the configured concurrency cap
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Write the raw Notion query response to the data directory before purging
        #[arg(long, action = ArgAction::SetTrue)]
        dump_snapshot: bool,
    },
    /// Configure credentials and settings
    #[command(
        long_about = "Manage configuration and credentials. Use subcommands to store the Discogs and Notion tokens or to point at the target database. Running without a subcommand shows the current configuration."
    )]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show full configuration including secrets
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Discogs personal access token
    #[command(
        long_about = "Store the Discogs personal access token (create one at https://www.discogs.com/settings/developers). Optionally pin the username instead of resolving it through the identity endpoint at runtime."
    )]
    Discogs {
        /// Discogs token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Pin the Discogs username
        #[arg(long)]
        username: Option<String>,
    },

    /// Configure the Notion integration token and target database
    #[command(
        long_about = "Store the Notion integration token and the id of the database the mirror lives in. The integration must be shared with that database."
    )]
    Notion {
        /// Notion integration token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Target database id
        #[arg(long)]
        database_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync {
            collection,
            wantlist,
            concurrency,
            dump_snapshot,
        } => sync::run_sync(collection, wantlist, concurrency, dump_snapshot, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
    }
}
