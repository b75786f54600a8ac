// Framework bootstrap for the client runtime.

use crate::frameworks::config::{self, ClientConfig};
use crate::interface_adapters::input::read_input_lines;
use crate::interface_adapters::net::run_transport;
use crate::interface_adapters::presenter::LogPresenter;
use crate::use_cases::{Outbound, Session, SessionEvent, SessionSummary};

use std::io::{BufRead, BufReader, Result};
use tokio::sync::mpsc;
use tracing::Instrument;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Joins the configured room and runs until the channel closes or input asks to quit.
///
/// `input` is read on a thread of its own that is never joined, so an idle input source
/// does not hold up shutdown.
pub async fn run<R>(config: ClientConfig, input: R) -> Result<SessionSummary>
where
    R: BufRead + Send + 'static,
{
    let span = tracing::info_span!(
        "session",
        room_id = %config.room_id,
        player_id = %config.identity.player_id
    );

    // events_tx/rx: transport events and user input all go to the single session loop.
    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>(config::EVENT_CHANNEL_CAPACITY);
    // outbound_tx/rx: messages from the channel to the socket writer.
    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(config::OUTBOUND_CHANNEL_CAPACITY);

    spawn_input_reader(input, events_tx.clone(), span.clone()).inspect_err(|e| {
        tracing::error!(error = %e, "failed to start input reader");
    })?;

    let url = config.socket_url.to_string();
    let transport = tokio::spawn(
        async move {
            if let Err(e) = run_transport(url, events_tx, outbound_rx).await {
                tracing::debug!(error = %e, "transport stopped");
            }
        }
        .instrument(span.clone()),
    );

    let mut presenter = LogPresenter::new();
    let session = Session::new(config.identity, outbound_tx, config::VIEWPORT);
    let summary = session
        .run(events_rx, &mut presenter)
        .instrument(span)
        .await;

    // Dropping the session closed the outbound queue, so the transport winds down on its own.
    if let Err(e) = transport.await {
        tracing::error!(error = %e, "transport task failed");
    }
    Ok(summary)
}

fn spawn_input_reader<R>(
    input: R,
    events_tx: mpsc::Sender<SessionEvent>,
    span: tracing::Span,
) -> Result<()>
where
    R: BufRead + Send + 'static,
{
    std::thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            let _entered = span.enter();
            read_input_lines(input, events_tx);
        })?;
    Ok(())
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = ClientConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::io::Error::other(e)
    })?;
    tracing::info!(
        url = %config.socket_url,
        name = %config.identity.name,
        civilization = config.identity.civilization.as_wire(),
        "joining room"
    );

    let summary = run(config, BufReader::new(std::io::stdin())).await?;
    tracing::debug!(
        events = summary.events,
        frames = summary.frames,
        "client stopped"
    );
    Ok(())
}
