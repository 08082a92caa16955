mod auth_cmd;
mod calls_cmd;
mod config_cmd;
mod context;
mod output;
mod watch_cmd;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "callboard", about = "callboard CLI - browse, annotate and archive calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which page of calls to show and how to narrow it.
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Calls per page (defaults to `list.per_page` from the config)
    #[arg(long)]
    per_page: Option<u32>,

    /// all, archived, unarchived, or a call type (missed, answered, "voice mail", ...)
    #[arg(long, default_value = "all")]
    filter: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// List calls
    Calls {
        #[command(flatten)]
        page: PageArgs,

        /// Print each call's notes under it
        #[arg(long)]
        notes: bool,
    },

    /// Add a note to a call
    Note {
        /// Call id
        id: String,
        /// Note text
        content: String,
    },

    /// Toggle a call's archived flag
    Archive {
        /// Call id
        id: String,

        /// The call is expected to be archived and should be restored
        #[arg(long)]
        unarchive: bool,
    },

    /// Keep the session fresh and print pushed call updates until Ctrl+C
    Watch {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show or set configuration
    Config {
        /// Set the API base URL
        #[arg(long)]
        server: Option<String>,

        /// Set the realtime app key
        #[arg(long)]
        pusher_key: Option<String>,

        /// Set the realtime cluster
        #[arg(long)]
        pusher_cluster: Option<String>,

        /// Set the realtime channel auth endpoint
        #[arg(long)]
        pusher_auth: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { username, password } => auth_cmd::run_login(username, password).await,
        Commands::Logout => auth_cmd::run_logout(),
        Commands::Calls { page, notes } => calls_cmd::run_calls(&page, notes).await,
        Commands::Note { id, content } => calls_cmd::run_note(&id, &content).await,
        Commands::Archive { id, unarchive } => calls_cmd::run_archive(&id, !unarchive).await,
        Commands::Watch { page } => watch_cmd::run_watch(&page).await,
        Commands::Config {
            server,
            pusher_key,
            pusher_cluster,
            pusher_auth,
        } => {
            let update = config_cmd::ConfigUpdate {
                server,
                pusher_key,
                pusher_cluster,
                pusher_auth,
            };
            if update.is_empty() {
                config_cmd::show_config()
            } else {
                config_cmd::set_config(update)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
