use crate::application::connections::DEFAULT_SYNC_INTERVAL_MINUTES;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tradesync", about = "Broker statement import and trade sync")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a broker connection
    ConnectionAdd {
        /// Owner of the connection
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        /// Trading platform label (MT4, MT5, cTrader, ...)
        #[arg(long, default_value = "Other")]
        platform: String,
        /// Source kind (statement, hybrid_funding)
        #[arg(long, default_value = "statement")]
        kind: String,
        /// URL of the statement or dashboard page
        #[arg(long, default_value = "")]
        url: String,
        /// Minutes between automatic syncs
        #[arg(long, default_value_t = DEFAULT_SYNC_INTERVAL_MINUTES)]
        interval: u32,
        /// Include in `watch` runs
        #[arg(long)]
        auto_sync: bool,
    },
    /// List broker connections
    Connections {
        /// Only this user's connections
        #[arg(long)]
        user: Option<String>,
    },
    /// Delete a connection with its trades and sync history
    ConnectionDelete { id: String },
    /// Fetch and sync a connection now
    Sync {
        id: String,
        /// Patch every matched trade even when its P&L is unchanged
        #[arg(long)]
        force: bool,
        /// Force a statement format instead of detecting it
        #[arg(long)]
        format: Option<String>,
        /// Retry through AI extraction when a text statement yields no trades
        #[arg(long)]
        ai_fallback: bool,
    },
    /// Import a statement file into a connection
    Import {
        id: String,
        file: String,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        ai_fallback: bool,
    },
    /// Parse a statement file and print the result without storing anything
    Parse {
        file: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        ai_fallback: bool,
    },
    /// List stored trades of a connection
    Trades { id: String },
    /// Show recent sync runs of a connection
    Logs {
        id: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Handle one sync-trigger request (JSON body) as the given user
    Trigger {
        /// Authenticated caller; omit to simulate an anonymous request
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value = "POST")]
        method: String,
        body: String,
    },
    /// Run due auto syncs, once or on a fixed tick
    Watch {
        /// Seconds between checks
        #[arg(long, default_value = "60")]
        every: u64,
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },
}
