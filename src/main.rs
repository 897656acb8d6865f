//! CodeFable - chat relay and terminal client
//!
//! `codefable serve` runs the relay in front of the assistant backend.
//! `codefable chat` drives a conversation against a running relay.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codefable::backend::{AssistantBackend, ExchangeReply};
use codefable::config::{ClientConfig, Config};
use codefable::conversation::{resolve_session_id, FileSessionStore};
use codefable::core::{
    bounded_send, view::SEND_HINT, ChatView, ConversationController, ExchangeError,
    HttpRelayClient, PendingExchange, RelayTransport, TerminalView,
};
use codefable::{routes, AppState};

#[derive(Parser)]
#[command(name = "codefable", version, about = "CodeFable chat relay and client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay server (default)
    Serve,
    /// Chat with the assistant through a running relay
    Chat {
        /// TOML client configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Relay base address, overrides the config file
        #[arg(long)]
        relay_url: Option<String>,
        /// Client storage file holding the session id
        #[arg(long)]
        storage: Option<PathBuf>,
        /// Seconds before an exchange is reported as failed
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let command = Cli::parse().command.unwrap_or(Command::Serve);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(&command).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match command {
        Command::Serve => serve().await,
        Command::Chat {
            config,
            relay_url,
            storage,
            timeout,
        } => {
            let mut client_config = match config {
                Some(path) => ClientConfig::from_file(&path)?,
                None => ClientConfig::default(),
            };
            if let Some(url) = relay_url {
                client_config.relay_url = url;
            }
            if let Some(path) = storage {
                client_config.storage_path = path;
            }
            if let Some(secs) = timeout {
                client_config.timeout_secs = secs;
            }
            chat(client_config).await
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let backend = AssistantBackend::from_config(&config)?;
    tracing::info!("🔗 Forwarding to {}", backend.endpoint());

    let state = AppState::new(config, backend);

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("🔥 CodeFable relay running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The chat session shares the terminal with the conversation, so it only
/// logs problems unless `RUST_LOG` says otherwise.
fn default_log_filter(command: &Command) -> &'static str {
    match command {
        Command::Serve => "codefable=debug,tower_http=debug",
        Command::Chat { .. } => "codefable=warn",
    }
}

/// An admitted send and the task carrying its relay call
type InFlight = (PendingExchange, JoinHandle<Result<ExchangeReply, ExchangeError>>);

async fn chat(config: ClientConfig) -> anyhow::Result<()> {
    let store = FileSessionStore::new(&config.storage_path);
    let session_id = resolve_session_id(&store)?;

    let transport = Arc::new(HttpRelayClient::new(&config.relay_url));
    tracing::info!(session_id = %session_id, relay = %transport.url(), "Starting chat");

    let mut controller = ConversationController::new(
        session_id,
        transport.clone(),
        TerminalView::new(std::io::stdout()),
    )
    .with_timeout(config.timeout());

    println!("{} (end a line with \\ to continue it)", SEND_HINT);

    // stdin keeps being read while a reply is pending, so Enter during that
    // window goes through admission control instead of queueing up.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight: Option<InFlight> = None;
    let mut stdin_open = true;

    while stdin_open || in_flight.is_some() {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if let Some(pending) = compose(&mut controller, &line) {
                        let transport = transport.clone();
                        let request = pending.request().clone();
                        let timeout = controller.timeout();
                        let handle = tokio::spawn(async move {
                            bounded_send(transport.as_ref(), &request, timeout).await
                        });
                        in_flight = Some((pending, handle));
                    }
                }
                None => stdin_open = false,
            },
            result = reply(&mut in_flight), if in_flight.is_some() => {
                if let Some((pending, _)) = in_flight.take() {
                    controller.complete_send(pending, result);
                }
            }
        }
    }

    Ok(())
}

/// Feed one terminal line into the composer. A trailing backslash stands in
/// for Shift + Enter; any other line is Enter and asks to send.
fn compose<T: RelayTransport, V: ChatView>(
    controller: &mut ConversationController<T, V>,
    line: &str,
) -> Option<PendingExchange> {
    let (text, shift) = match line.strip_suffix('\\') {
        Some(text) => (text, true),
        None => (line, false),
    };

    let input = format!("{}{}", controller.pending_input(), text);
    controller.set_input(input);

    if shift {
        controller.insert_newline();
        None
    } else {
        controller.begin_send()
    }
}

async fn reply(in_flight: &mut Option<InFlight>) -> Result<ExchangeReply, ExchangeError> {
    match in_flight {
        Some((_, handle)) => handle
            .await
            .unwrap_or_else(|e| Err(ExchangeError::Transport(e.to_string()))),
        None => std::future::pending().await,
    }
}
