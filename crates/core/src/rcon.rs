//! Source-RCON client with timeout discipline and a circuit breaker.
//!
//! Wire format (little-endian): `[length: i32][id: i32][type: i32][body][\0\0]`
//! where `length` counts everything after itself. Type 3 is an auth request,
//! type 2 a command (and, server-to-client, the auth response), type 0 a
//! command response. Auth rejection is signalled by a response id of `-1`.
//!
//! Every [`RconClient::send`] opens a fresh connection scoped to the call, so
//! the socket is released on every exit path including timeouts. After any
//! failure the breaker opens for the backoff window and further sends fail
//! immediately with [`CoreError::CircuitOpen`]; there is no half-open probe
//! state, and a successful call does not close the breaker early.

use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{CoreError, CoreResult};

const TYPE_AUTH: i32 = 3;
const TYPE_COMMAND: i32 = 2;
const TYPE_AUTH_RESPONSE: i32 = 2;
const TYPE_RESPONSE_VALUE: i32 = 0;

const COMMAND_ID: i32 = 2;
/// Id of the trailing end-of-reply marker packet.
const SENTINEL_ID: i32 = 7;

/// Upper bound on a single frame body; anything larger is a corrupt stream.
const MAX_FRAME_LEN: i32 = 1 << 16;

/// Connection parameters for the RCON port.
#[derive(Debug, Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Deadline for the reachability probe and for connect+auth (default 2s).
    pub connect_timeout: Duration,
    /// Deadline for sending a command and reading its reply (default 2s).
    pub command_timeout: Duration,
    /// How long the circuit stays open after a failure (default 15s).
    pub backoff: Duration,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: "mc".to_string(),
            port: 25575,
            password: String::new(),
            connect_timeout: Duration::from_secs(2),
            command_timeout: Duration::from_secs(2),
            backoff: Duration::from_secs(15),
        }
    }
}

/// Long-lived RCON client handle. Cheap to share behind an `Arc`.
pub struct RconClient {
    config: RconConfig,
    /// `Some(instant)` while the breaker is open. Concurrent failures may
    /// each extend the window; it is never shortened.
    open_until: StdMutex<Option<Instant>>,
    /// FIFO gate for [`RconClient::send_queued`].
    queue: tokio::sync::Mutex<()>,
}

impl RconClient {
    pub fn new(config: RconConfig) -> Self {
        Self {
            config,
            open_until: StdMutex::new(None),
            queue: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether the breaker currently refuses sends.
    pub fn circuit_open(&self) -> bool {
        let open_until = self.open_until.lock().expect("breaker lock poisoned");
        matches!(*open_until, Some(until) if Instant::now() < until)
    }

    fn trip_circuit(&self) {
        let mut open_until = self.open_until.lock().expect("breaker lock poisoned");
        *open_until = Some(Instant::now() + self.config.backoff);
    }

    /// Force the breaker open for `window` (used when a caller has already
    /// observed the server down through another channel).
    pub fn open_circuit_for(&self, window: Duration) {
        let mut open_until = self.open_until.lock().expect("breaker lock poisoned");
        *open_until = Some(Instant::now() + window);
    }

    /// Send one command and return the raw reply text.
    ///
    /// Fails fast with [`CoreError::CircuitOpen`] while the breaker is open;
    /// any real failure trips the breaker before propagating.
    pub async fn send(&self, command: &str) -> CoreResult<String> {
        if self.circuit_open() {
            return Err(CoreError::CircuitOpen);
        }
        match self.send_once(command).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::debug!(error = %err, "RCON send failed, opening circuit");
                self.trip_circuit();
                Err(err)
            }
        }
    }

    /// Serialized variant: at most one in-flight command at a time, callers
    /// queued in FIFO order. Used for command sweeps (structure location)
    /// where the server handles concurrent RCON sessions poorly.
    pub async fn send_queued(&self, command: &str) -> CoreResult<String> {
        let _gate = self.queue.lock().await;
        self.send(command).await
    }

    async fn send_once(&self, command: &str) -> CoreResult<String> {
        self.probe_reachable().await?;

        let mut stream = timeout(self.config.connect_timeout, self.connect_and_auth())
            .await
            .map_err(|_| CoreError::Timeout("RCON connect"))??;

        let reply = timeout(self.config.command_timeout, run_command(&mut stream, command))
            .await
            .map_err(|_| CoreError::Timeout("RCON command"))??;

        // Best-effort close; the reply is already in hand.
        let _ = stream.shutdown().await;
        Ok(reply)
    }

    /// Cheap TCP-connect probe so a dead host fails in one connect timeout
    /// instead of a connect plus auth round trip.
    async fn probe_reachable(&self) -> CoreResult<()> {
        let addr = (self.config.host.as_str(), self.config.port);
        match timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_probe)) => Ok(()),
            Ok(Err(_)) => Err(CoreError::Unreachable),
            Err(_) => Err(CoreError::Unreachable),
        }
    }

    async fn connect_and_auth(&self) -> CoreResult<TcpStream> {
        let addr = (self.config.host.as_str(), self.config.port);
        let mut stream = TcpStream::connect(addr).await?;

        write_packet(&mut stream, 1, TYPE_AUTH, &self.config.password).await?;
        // Some servers emit an empty response-value frame before the auth
        // response; skip forward until the auth response type shows up.
        loop {
            let (id, ptype, _body) = read_packet(&mut stream).await?;
            if ptype == TYPE_AUTH_RESPONSE {
                if id == -1 {
                    return Err(CoreError::AuthFailed);
                }
                return Ok(stream);
            }
        }
    }
}

/// Send one command and reassemble its reply.
///
/// Replies larger than one frame (~4KB) arrive fragmented. A trailing
/// response-value packet with a distinct id marks the end: the server
/// answers it only after every fragment of the real reply, so fragments
/// are concatenated until the sentinel id comes back.
async fn run_command(stream: &mut TcpStream, command: &str) -> CoreResult<String> {
    write_packet(stream, COMMAND_ID, TYPE_COMMAND, command).await?;
    write_packet(stream, SENTINEL_ID, TYPE_RESPONSE_VALUE, "").await?;
    let mut body = String::new();
    loop {
        let (id, _ptype, fragment) = read_packet(stream).await?;
        if id == SENTINEL_ID {
            return Ok(body);
        }
        body.push_str(&fragment);
    }
}

/// Encode and write one frame.
pub(crate) async fn write_packet<W>(writer: &mut W, id: i32, ptype: i32, body: &str) -> CoreResult<()>
where
    W: AsyncWrite + Unpin,
{
    let body = body.as_bytes();
    let len = (4 + 4 + body.len() + 2) as i32;
    let mut frame = Vec::with_capacity(4 + len as usize);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&id.to_le_bytes());
    frame.extend_from_slice(&ptype.to_le_bytes());
    frame.extend_from_slice(body);
    frame.extend_from_slice(&[0, 0]);
    writer.write_all(&frame).await?;
    Ok(())
}

/// Read one frame, returning `(id, type, body)`.
pub(crate) async fn read_packet<R>(reader: &mut R) -> CoreResult<(i32, i32, String)>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = i32::from_le_bytes(len_buf);
    if !(10..=MAX_FRAME_LEN).contains(&len) {
        return Err(CoreError::Protocol(format!("bad RCON frame length {len}")));
    }

    let mut frame = vec![0u8; len as usize];
    reader.read_exact(&mut frame).await?;

    let id = i32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    let ptype = i32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
    let body = String::from_utf8_lossy(&frame[8..len as usize - 2]).into_owned();
    Ok((id, ptype, body))
}
