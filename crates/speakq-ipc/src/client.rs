//! IPC client implementation
//!
//! A subscribed connection carries both responses and events, and the
//! server may write an event before the response to the request that
//! caused it. Event lines read while waiting for a response are kept and
//! handed out first by the [`EventStream`].

use speakq_api::{Command, Event, Request, Response, ResponseResult};
use std::collections::VecDeque;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tracing::debug;

use crate::{IpcError, IpcResult};

/// One line from the service
enum Incoming {
    Response(Response),
    Event(Event),
}

/// Read and classify the next line. Responses carry a `request_id`,
/// events do not.
async fn read_incoming(reader: &mut BufReader<OwnedReadHalf>) -> IpcResult<Incoming> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(IpcError::ConnectionClosed);
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    let value: serde_json::Value = serde_json::from_str(line.trim())?;
    if value.get("request_id").is_some() {
        Ok(Incoming::Response(serde_json::from_value(value)?))
    } else {
        Ok(Incoming::Event(serde_json::from_value(value)?))
    }
}

/// Connection to a running speakqd
pub struct IpcClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_request_id: u64,
    pending_events: VecDeque<Event>,
}

impl IpcClient {
    pub async fn connect(socket_path: impl AsRef<Path>) -> IpcResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            next_request_id: 1,
            pending_events: VecDeque::new(),
        })
    }

    /// Send a command and wait for its response
    pub async fn send(&mut self, command: Command) -> IpcResult<Response> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let mut json = serde_json::to_string(&Request::new(request_id, command))?;
        json.push('\n');
        self.writer.write_all(json.as_bytes()).await?;

        loop {
            match read_incoming(&mut self.reader).await? {
                Incoming::Event(event) => {
                    debug!(request_id, "Event arrived ahead of response, buffering");
                    self.pending_events.push_back(event);
                }
                Incoming::Response(response) if response.request_id == request_id => {
                    return Ok(response);
                }
                Incoming::Response(response) => {
                    return Err(IpcError::InvalidMessage(format!(
                        "Expected response to request {}, got {}",
                        request_id, response.request_id
                    )));
                }
            }
        }
    }

    /// Subscribe to events. The client is consumed; the connection now
    /// only delivers events.
    pub async fn subscribe(mut self) -> IpcResult<EventStream> {
        let response = self.send(Command::SubscribeEvents).await?;

        if let ResponseResult::Err(e) = response.result {
            return Err(IpcError::ServerError(e.message));
        }

        Ok(EventStream {
            reader: self.reader,
            pending: self.pending_events,
            _writer: self.writer,
        })
    }
}

/// Events from a subscribed connection, oldest first
pub struct EventStream {
    reader: BufReader<OwnedReadHalf>,
    pending: VecDeque<Event>,
    // Dropping the write half would make the server see a disconnect
    _writer: OwnedWriteHalf,
}

impl EventStream {
    /// Wait for the next event
    pub async fn next(&mut self) -> IpcResult<Event> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }

        loop {
            match read_incoming(&mut self.reader).await? {
                Incoming::Event(event) => return Ok(event),
                Incoming::Response(response) => {
                    debug!(request_id = response.request_id, "Ignoring response on event stream");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakq_api::{EventPayload, ResponsePayload};
    use speakq_util::ClientId;
    use tempfile::tempdir;
    use tokio::net::UnixListener;

    macro_rules! ndjson {
        ($value:expr) => {
            format!("{}\n", serde_json::to_string(&$value).unwrap())
        };
    }

    #[tokio::test]
    async fn test_events_ahead_of_subscribe_response_are_kept() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("early.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        // Service that writes an event before answering the subscription
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();
            let request: Request = serde_json::from_str(request_line.trim()).unwrap();

            write_half
                .write_all(ndjson!(Event::new(EventPayload::QueueReset)).as_bytes())
                .await
                .unwrap();
            let response = Response::success(
                request.request_id,
                ResponsePayload::Subscribed {
                    client_id: ClientId::new(),
                },
            );
            write_half.write_all(ndjson!(response).as_bytes()).await.unwrap();
            write_half
                .write_all(ndjson!(Event::new(EventPayload::QueueCompleted)).as_bytes())
                .await
                .unwrap();

            // Hold the connection open until the client is done reading
            let mut rest = String::new();
            let _ = reader.read_line(&mut rest).await;
        });

        let client = IpcClient::connect(&socket_path).await.unwrap();
        let mut events = client.subscribe().await.unwrap();

        assert!(matches!(events.next().await.unwrap().payload, EventPayload::QueueReset));
        assert!(matches!(events.next().await.unwrap().payload, EventPayload::QueueCompleted));
    }

    #[tokio::test]
    async fn test_mismatched_response_is_rejected() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("mismatch.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();

            let response = Response::success(99, ResponsePayload::Pong);
            write_half.write_all(ndjson!(response).as_bytes()).await.unwrap();

            let mut rest = String::new();
            let _ = reader.read_line(&mut rest).await;
        });

        let mut client = IpcClient::connect(&socket_path).await.unwrap();
        assert!(matches!(
            client.send(Command::Ping).await,
            Err(IpcError::InvalidMessage(_))
        ));
    }
}
