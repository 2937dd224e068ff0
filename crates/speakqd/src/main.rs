//! speakqd - The speaker queue service
//!
//! This is the main entry point for the speakqd service.
//! It wires together all the components:
//! - Configuration loading
//! - Turn scheduler
//! - Chat announcements and commands
//! - IPC server

use anyhow::{Context, Result};
use clap::Parser;
use speakq_api::{ErrorCode, ErrorInfo, Event, EventPayload, Response};
use speakq_config::{load_config, QueueConfig};
use speakq_core::{CoreEvent, Scheduler};
use speakq_ipc::{IpcServer, ServerMessage};
use speakq_util::{default_config_path, ClientId, Clock, RateLimiter, SystemClock};
use speakqd::{event_payload, handle_command, ChatBridge, IpcChatSink};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Idle clients are forgotten by the rate limiter after this long
const RATE_LIMIT_STALE_AFTER: Duration = Duration::from_secs(300);

/// speakqd - Speaker queue service for online meetings
#[derive(Parser, Debug)]
#[command(name = "speakqd")]
#[command(about = "Speaker queue service for online meetings", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/speakq/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket path override (or set SPEAKQ_SOCKET env var)
    #[arg(short, long, env = "SPEAKQ_SOCKET")]
    socket: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    scheduler: Scheduler,
    chat: ChatBridge,
    ipc: Arc<IpcServer>,
    rate_limiter: RateLimiter<ClientId>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let config = Self::load_config(args)?;

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| config.service.socket_path.clone());

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let scheduler = Scheduler::from_config(&config, clock.clone());

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start()
            .await
            .with_context(|| format!("Failed to start IPC server on {:?}", socket_path))?;
        let ipc = Arc::new(ipc);

        info!(socket_path = %socket_path.display(), "IPC server started");

        let chat = ChatBridge::new(
            &config.chat,
            Box::new(IpcChatSink::new(ipc.clone())),
            clock.clone(),
        );

        let rate_limiter = RateLimiter::new(
            config.service.requests_per_second,
            Duration::from_secs(1),
        );

        Ok(Self {
            scheduler,
            chat,
            ipc,
            rate_limiter,
            clock,
            tick_interval: config.service.tick_interval,
        })
    }

    /// Explicit config paths must load; the default path is optional
    fn load_config(args: &Args) -> Result<QueueConfig> {
        let (path, explicit) = match &args.config {
            Some(path) => (path.clone(), true),
            None => (default_config_path(), false),
        };

        if !explicit && !path.exists() {
            info!(config_path = %path.display(), "No config file, using defaults");
            return Ok(QueueConfig::default());
        }

        let config = load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))?;

        info!(
            config_path = %path.display(),
            format = %config.meeting.format,
            participant_count = config.participants.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    async fn run(self) -> Result<()> {
        let ipc = self.ipc.clone();
        let mut ipc_messages = ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        // Subscribe before anything can emit
        let mut core_events = self.scheduler.subscribe();

        let scheduler = Arc::new(Mutex::new(self.scheduler));
        let mut chat = self.chat;
        let mut rate_limiter = self.rate_limiter;
        let clock = self.clock;

        // Spawn IPC accept task
        let ipc_accept = ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let mut tick_timer = tokio::time::interval(self.tick_interval);

        info!(tick_interval_ms = self.tick_interval.as_millis() as u64, "Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                // Tick timer - deferred actions and time warnings
                _ = tick_timer.tick() => {
                    let mut scheduler = scheduler.lock().await;
                    if scheduler.tick() {
                        Self::relay_core_events(&mut core_events, &ipc, &mut chat);
                        ipc.broadcast_event(Event::new(EventPayload::StateChanged(scheduler.snapshot())));
                    }
                }

                Some(msg) = ipc_messages.recv() => {
                    let mut scheduler = scheduler.lock().await;
                    Self::handle_ipc_message(
                        &mut scheduler,
                        &mut chat,
                        &ipc,
                        &mut rate_limiter,
                        clock.as_ref(),
                        &mut core_events,
                        msg,
                    )
                    .await;
                }
            }
        }

        info!("Shutting down speakqd");

        ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        // Give writers a moment to flush the shutdown event
        tokio::time::sleep(Duration::from_millis(50)).await;
        ipc.shutdown();

        info!("Shutdown complete");
        Ok(())
    }

    /// Forward everything the scheduler emitted to IPC subscribers and chat
    fn relay_core_events(
        core_events: &mut broadcast::Receiver<CoreEvent>,
        ipc: &Arc<IpcServer>,
        chat: &mut ChatBridge,
    ) {
        loop {
            match core_events.try_recv() {
                Ok(event) => {
                    debug!(event = ?event, "Relaying core event");
                    ipc.broadcast_event(Event::new(event_payload(&event)));
                    chat.on_event(&event);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Core event relay lagged, events dropped");
                }
                Err(_) => break,
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_ipc_message(
        scheduler: &mut Scheduler,
        chat: &mut ChatBridge,
        ipc: &Arc<IpcServer>,
        rate_limiter: &mut RateLimiter<ClientId>,
        clock: &dyn Clock,
        core_events: &mut broadcast::Receiver<CoreEvent>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                if !rate_limiter.check(&client_id, clock.now()) {
                    let response = Response::error(
                        request.request_id,
                        ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                    );
                    let _ = ipc.send_response(&client_id, response).await;
                    return;
                }

                if request.api_version != speakq_api::API_VERSION {
                    let response = Response::error(
                        request.request_id,
                        ErrorInfo::new(
                            ErrorCode::UnsupportedVersion,
                            format!(
                                "API version {} not supported, expected {}",
                                request.api_version,
                                speakq_api::API_VERSION
                            ),
                        ),
                    );
                    let _ = ipc.send_response(&client_id, response).await;
                    return;
                }

                let mutating = request.command.is_mutating();
                let response =
                    handle_command(scheduler, chat, &client_id, request.request_id, request.command);

                if let Err(e) = ipc.send_response(&client_id, response).await {
                    debug!(client_id = %client_id, error = %e, "Failed to send response");
                }

                Self::relay_core_events(core_events, ipc, chat);
                if mutating {
                    ipc.broadcast_event(Event::new(EventPayload::StateChanged(scheduler.snapshot())));
                }
            }

            ServerMessage::ClientConnected { client_id } => {
                debug!(client_id = %client_id, "Client registered");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
                rate_limiter.remove(&client_id);
                rate_limiter.cleanup(RATE_LIMIT_STALE_AFTER, clock.now());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "speakqd starting");

    let service = Service::new(&args).await?;
    service.run().await
}
