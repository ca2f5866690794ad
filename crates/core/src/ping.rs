//! Server list ping: the lightweight status probe on the game port.
//!
//! Used as the middle stage of the occupancy fallback chain when RCON is
//! down: it only yields a coarse `{online, max}` plus version/MOTD, no
//! roster. The wire format is the VarInt-framed handshake + status request
//! of the Minecraft status protocol; the JSON payload in the response is
//! self-describing.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{CoreError, CoreResult};

/// Protocol version sent in the handshake. The status exchange does not
/// validate it strictly; 767 corresponds to the 1.21 line.
const PROTOCOL_VERSION: i32 = 767;

/// Coarse occupancy from the status handshake.
#[derive(Debug, Clone, Serialize)]
pub struct PingPlayers {
    pub online: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PingResult {
    pub online: bool,
    pub latency_ms: u64,
    pub version: Option<String>,
    pub players: Option<PingPlayers>,
    pub motd: Option<String>,
}

/// Ping the game port and decode the status JSON.
///
/// The whole exchange (connect, handshake, response) runs under one
/// deadline; a dead or slow server yields `Timeout`/`Unreachable` rather
/// than hanging the caller.
pub async fn server_list_ping(host: &str, port: u16, deadline: Duration) -> CoreResult<PingResult> {
    let started = Instant::now();
    let result = timeout(deadline, ping_exchange(host, port)).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(json)) => Ok(decode_status_json(&json, latency_ms)),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(CoreError::Timeout("server ping")),
    }
}

async fn ping_exchange(host: &str, port: u16) -> CoreResult<serde_json::Value> {
    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(|_| CoreError::Unreachable)?;

    // Handshake packet: id 0x00, protocol version, host, port, next state 1.
    let mut handshake = Vec::new();
    write_varint(&mut handshake, 0x00);
    write_varint(&mut handshake, PROTOCOL_VERSION);
    write_varint(&mut handshake, host.len() as i32);
    handshake.extend_from_slice(host.as_bytes());
    handshake.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut handshake, 1);
    write_frame(&mut stream, &handshake).await?;

    // Status request: id 0x00, empty body.
    let mut request = Vec::new();
    write_varint(&mut request, 0x00);
    write_frame(&mut stream, &request).await?;

    // Status response: id 0x00, VarInt-prefixed JSON string.
    loop {
        let frame = read_frame(&mut stream).await?;
        let mut cursor = &frame[..];
        let packet_id = read_varint(&mut cursor).await?;
        if packet_id != 0x00 {
            continue; // ignore interleaved pong frames
        }
        let json_len = read_varint(&mut cursor).await? as usize;
        if cursor.len() < json_len {
            return Err(CoreError::Protocol("short status payload".to_string()));
        }
        let payload = std::str::from_utf8(&cursor[..json_len])
            .map_err(|_| CoreError::Protocol("status payload is not UTF-8".to_string()))?;
        return serde_json::from_str(payload)
            .map_err(|err| CoreError::Protocol(format!("bad status JSON: {err}")));
    }
}

fn decode_status_json(json: &serde_json::Value, latency_ms: u64) -> PingResult {
    let players = json.get("players").map(|p| PingPlayers {
        online: p.get("online").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        max: p.get("max").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
    });
    let version = json
        .pointer("/version/name")
        .and_then(|v| v.as_str())
        .map(str::to_owned);
    // The MOTD is either a bare string or a text component.
    let motd = json
        .get("description")
        .and_then(|d| d.as_str().or_else(|| d.pointer("/text").and_then(|t| t.as_str())))
        .map(str::to_owned);

    PingResult {
        online: true,
        latency_ms,
        version,
        players,
        motd,
    }
}

fn write_varint(out: &mut Vec<u8>, value: i32) {
    let mut v = value as u32;
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
}

async fn read_varint<R>(reader: &mut R) -> CoreResult<i32>
where
    R: AsyncRead + Unpin,
{
    let mut value: u32 = 0;
    for shift in 0..5 {
        let byte = reader.read_u8().await?;
        value |= ((byte & 0x7f) as u32) << (7 * shift);
        if byte & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(CoreError::Protocol("varint too long".to_string()))
}

async fn write_frame<W>(writer: &mut W, packet: &[u8]) -> CoreResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut length = Vec::new();
    write_varint(&mut length, packet.len() as i32);
    writer.write_all(&length).await?;
    writer.write_all(packet).await?;
    Ok(())
}

async fn read_frame<R>(reader: &mut R) -> CoreResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let len = read_varint(reader).await? as usize;
    if len == 0 || len > 1 << 21 {
        return Err(CoreError::Protocol(format!("bad ping frame length {len}")));
    }
    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(frame)
}
