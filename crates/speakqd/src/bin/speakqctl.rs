//! speakqctl - command-line client for speakqd

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use speakq_api::{Command, MeetingFormat, ResponseResult};
use speakq_ipc::{IpcClient, IpcError};
use speakq_util::{default_socket_path, ParticipantId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "speakqctl")]
#[command(about = "Control a running speakqd", long_about = None)]
struct Args {
    /// Socket path (or set SPEAKQ_SOCKET env var)
    #[arg(short, long, env = "SPEAKQ_SOCKET", default_value_os_t = default_socket_path())]
    socket: PathBuf,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the full queue state
    State,
    /// Add a participant at the end of the queue
    Add { id: String, name: String },
    /// Announce the queue and start the first speaker
    StartQueue,
    /// Start a participant speaking
    Start { id: String },
    /// Start the next waiting participant now
    Next,
    /// End a participant's turn, or the current one
    End { id: Option<String> },
    Skip { id: String },
    Pause { id: String },
    Unpause { id: String },
    /// Set the queue order, first to last
    Reorder { ids: Vec<String> },
    Shuffle,
    Reset,
    /// Mark everyone still queued as done
    CompleteRound,
    /// standard, round_robin or time_box
    Format { format: String },
    TimeLimit { seconds: u64 },
    AutoAdvance {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Auto-advance delay in seconds (clamped to 0..=30)
    Delay {
        #[arg(allow_negative_numbers = true)]
        seconds: i64,
    },
    NextSpeaker,
    Progress,
    Settings,
    /// Send a chat line, e.g. "!status"
    Chat { text: String },
    Health,
    Ping,
    /// Stream events until the daemon goes away
    Watch,
}

fn parse_format(s: &str) -> Result<MeetingFormat> {
    match s {
        "standard" => Ok(MeetingFormat::Standard),
        "round_robin" | "round-robin" => Ok(MeetingFormat::RoundRobin),
        "time_box" | "time-box" => Ok(MeetingFormat::TimeBox),
        other => bail!("Unknown meeting format: {}", other),
    }
}

fn to_command(cmd: Cmd) -> Result<Command> {
    let command = match cmd {
        Cmd::State => Command::GetState,
        Cmd::Add { id, name } => Command::AddParticipant {
            id: ParticipantId::new(id),
            name,
        },
        Cmd::StartQueue => Command::StartQueue,
        Cmd::Start { id } => Command::StartSpeaking {
            id: ParticipantId::new(id),
        },
        Cmd::Next => Command::StartNext,
        Cmd::End { id: Some(id) } => Command::EndTurn {
            id: ParticipantId::new(id),
        },
        Cmd::End { id: None } => Command::EndCurrentTurn,
        Cmd::Skip { id } => Command::Skip {
            id: ParticipantId::new(id),
        },
        Cmd::Pause { id } => Command::Pause {
            id: ParticipantId::new(id),
        },
        Cmd::Unpause { id } => Command::Unpause {
            id: ParticipantId::new(id),
        },
        Cmd::Reorder { ids } => Command::Reorder {
            ids: ids.into_iter().map(ParticipantId::new).collect(),
        },
        Cmd::Shuffle => Command::Shuffle,
        Cmd::Reset => Command::Reset,
        Cmd::CompleteRound => Command::CompleteRound,
        Cmd::Format { format } => Command::SetFormat {
            format: parse_format(&format)?,
        },
        Cmd::TimeLimit { seconds } => Command::SetTimeLimit { seconds },
        Cmd::AutoAdvance { enabled } => Command::SetAutoAdvance { enabled },
        Cmd::Delay { seconds } => Command::SetAutoAdvanceDelay { seconds },
        Cmd::NextSpeaker => Command::GetNextSpeaker,
        Cmd::Progress => Command::GetProgress,
        Cmd::Settings => Command::GetSettings,
        Cmd::Chat { text } => Command::ChatMessage { text },
        Cmd::Health => Command::GetHealth,
        Cmd::Ping => Command::Ping,
        Cmd::Watch => Command::SubscribeEvents,
    };
    Ok(command)
}

async fn watch(client: IpcClient) -> Result<()> {
    let mut events = client.subscribe().await.context("Failed to subscribe")?;

    loop {
        match events.next().await {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(IpcError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e).context("Event stream failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Failed to connect to speakqd at {:?}", args.socket))?;

    if matches!(args.command, Cmd::Watch) {
        return watch(client).await;
    }

    let command = to_command(args.command)?;
    let response = client.send(command).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if let ResponseResult::Err(e) = response.result {
        bail!("{:?}: {}", e.code, e.message);
    }
    Ok(())
}
