use clap::Parser;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tradesync::application::connections::NewConnection;
use tradesync::application::parsing::{Document, ParseOptions};
use tradesync::application::sync::SyncOptions;
use tradesync::cli::commands::{Cli, Commands};
use tradesync::config::AppConfig;
use tradesync::domain::values::format_tag::FormatTag;
use tradesync::domain::values::source_kind::SourceKind;
use tradesync::domain::values::sync_status::SyncType;
use tradesync::TradeSync;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("TRADESYNC_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let ts = match TradeSync::new(&config) {
        Ok(ts) => ts,
        Err(e) => {
            eprintln!("Error initializing tradesync: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(ts, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(ts: TradeSync, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::ConnectionAdd {
            user,
            name,
            platform,
            kind,
            url,
            interval,
            auto_sync,
        } => {
            let source_kind: SourceKind = kind.parse().map_err(|e: String| e)?;
            let connection = ts.add_connection(NewConnection {
                user_id: user,
                name,
                platform,
                source_kind,
                source_url: url,
                sync_interval_minutes: interval,
                auto_sync,
            })?;
            println!("{}", serde_json::to_string_pretty(&connection)?);
        }
        Commands::Connections { user } => {
            let connections = ts.connections(user.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&connections)?);
        }
        Commands::ConnectionDelete { id } => {
            ts.delete_connection(&id)?;
            println!("Connection {id} deleted");
        }
        Commands::Sync {
            id,
            force,
            format,
            ai_fallback,
        } => {
            let options = SyncOptions {
                force_refresh: force,
                sync_type: SyncType::Manual,
                parse: parse_options(format, ai_fallback)?,
            };
            let outcome = ts.sync(&id, &options).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Import {
            id,
            file,
            force,
            format,
            ai_fallback,
        } => {
            let options = SyncOptions {
                force_refresh: force,
                sync_type: SyncType::Import,
                parse: parse_options(format, ai_fallback)?,
            };
            let outcome = ts.import(&id, read_document(&file)?, &options).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Parse {
            file,
            format,
            ai_fallback,
        } => {
            let parsed = ts
                .parse(&read_document(&file)?, &parse_options(format, ai_fallback)?)
                .await;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Trades { id } => {
            let trades = ts.trades(&id)?;
            println!("{}", serde_json::to_string_pretty(&trades)?);
        }
        Commands::Logs { id, limit } => {
            let logs = ts.logs(&id, limit)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        Commands::Trigger { user, method, body } => {
            let response = ts.trigger(&method, user.as_deref(), &body).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Watch { every, once } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));
            loop {
                ticker.tick().await;
                match ts.run_due(chrono::Utc::now()).await {
                    Ok(report) => {
                        info!(checked = report.checked, synced = report.results.len(), "auto sync pass done");
                        if once {
                            println!("{}", serde_json::to_string_pretty(&report)?);
                        }
                    }
                    Err(e) if once => return Err(e.into()),
                    Err(e) => error!(error = %e, "auto sync pass failed"),
                }
                if once {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn parse_options(format: Option<String>, ai_fallback: bool) -> Result<ParseOptions, String> {
    let format_override = format.map(|f| f.parse::<FormatTag>()).transpose()?;
    Ok(ParseOptions {
        format_override,
        ai_fallback,
    })
}

fn read_document(path: &str) -> Result<Document, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(Document::new(filename, bytes))
}
