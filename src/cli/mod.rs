mod repl;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppConfig;
use crate::core::message::{ChatSession, HistoryEntry, Sender};
use crate::router::Router;
use crate::storage::Database;

#[derive(Parser)]
#[command(name = "dkchat", version, about = "Chat com busca ao vivo e histórico local")]
struct Cli {
    /// Override the SQLite history file location
    #[arg(long, env = "DKCHAT_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message and print the reply
    Ask {
        /// The message; joined with spaces
        message: Vec<String>,
    },
    /// List stored sessions
    Sessions,
}

/// Everything a command needs: open store plus configured router.
pub struct App {
    pub db: Database,
    pub router: Router,
}

impl App {
    /// Reuse the most recent session, or start the first one.
    pub async fn resume_or_create(&self) -> Result<ChatSession> {
        match self.db.sessions().get_last().await? {
            Some(session) => Ok(session),
            None => Ok(self.db.sessions().create().await?),
        }
    }

    /// One full exchange: persist the user message, route, persist the reply.
    pub async fn exchange(&self, session_id: i64, message: &str) -> Result<String> {
        self.db
            .messages()
            .save(session_id, Sender::User, message)
            .await?;

        let history: Vec<HistoryEntry> = self
            .db
            .messages()
            .list(session_id)
            .await?
            .iter()
            .map(HistoryEntry::from)
            .collect();

        let reply = self.router.get_response(message, &history).await;

        self.db
            .messages()
            .save(session_id, Sender::Assistant, &reply)
            .await?;

        Ok(reply)
    }
}

pub async fn run_cli() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dkchat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    config.validate()?;

    let db = Database::open(&config).await?;
    db.run_migrations().await?;

    let router = Router::from_config(&config);
    let app = App { db, router };

    match cli.command {
        None => repl::run(app).await,
        Some(Command::Ask { message }) => {
            let message = message.join(" ");
            let message = message.trim();
            if message.is_empty() {
                anyhow::bail!("mensagem vazia");
            }
            let session = app.resume_or_create().await?;
            let reply = app.exchange(session.id, message).await?;
            println!("{reply}");
            Ok(())
        }
        Some(Command::Sessions) => {
            let sessions = app.db.sessions().list().await?;
            if sessions.is_empty() {
                println!("Nenhuma sessão.");
            } else {
                for s in sessions {
                    println!(
                        "  {:>4}  iniciada em {}",
                        s.id,
                        s.start_time.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
            }
            Ok(())
        }
    }
}
