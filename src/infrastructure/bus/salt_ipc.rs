//! Salt master event publisher over its local IPC socket
//!
//! The publisher writes a stream of msgpack frames `{head, body}` where
//! `body` is `tag + "\n\n" + msgpack(data)`. Older masters encode `body`
//! as a msgpack str, newer ones as bin.

use std::fmt;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::{self, Deserializer, IgnoredAny, Visitor};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tracing::{debug, warn};

use crate::application::ports::{BusError, EventBus};
use crate::domain::event::Event;

/// Delay between reconnection attempts after the publisher goes away
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

const TAG_DELIMITER: &[u8] = b"\n\n";
const READ_CHUNK: usize = 8192;

#[derive(Deserialize)]
struct Frame {
    body: Payload,
}

/// Frame body, accepted as either msgpack str or bin
struct Payload(Vec<u8>);

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = Payload;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or byte payload")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Payload, E> {
                Ok(Payload(v.as_bytes().to_vec()))
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Payload, E> {
                Ok(Payload(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Payload, E> {
                Ok(Payload(v))
            }
        }

        deserializer.deserialize_any(PayloadVisitor)
    }
}

/// Subscriber to `<sock_dir>/<node>_event_pub.ipc`
pub struct SaltIpcBus {
    path: PathBuf,
    stream: Option<UnixStream>,
    buffer: Vec<u8>,
    reconnect_interval: Duration,
}

impl SaltIpcBus {
    /// Socket path of the event publisher for `node` (e.g. `master`)
    pub fn socket_path(sock_dir: &Path, node: &str) -> PathBuf {
        sock_dir.join(format!("{}_event_pub.ipc", node))
    }

    /// Connect to the publisher. Failing to connect here is fatal; later
    /// disconnects are retried.
    pub async fn connect(path: impl Into<PathBuf>) -> Result<Self, BusError> {
        let path = path.into();
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|e| BusError::Connect {
                uri: format!("ipc://{}", path.display()),
                message: e.to_string(),
            })?;

        Ok(Self {
            path,
            stream: Some(stream),
            buffer: Vec::new(),
            reconnect_interval: RECONNECT_INTERVAL,
        })
    }

    /// Override the reconnect delay
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    async fn disconnected(&mut self, reason: &str) -> Result<Option<Event>, BusError> {
        warn!(uri = %self.uri(), reason, "Event publisher disconnected");
        self.stream = None;
        self.buffer.clear();
        tokio::time::sleep(self.reconnect_interval).await;
        Ok(None)
    }
}

#[async_trait]
impl EventBus for SaltIpcBus {
    fn uri(&self) -> String {
        format!("ipc://{}", self.path.display())
    }

    async fn next_event(&mut self) -> Result<Option<Event>, BusError> {
        if self.stream.is_none() {
            match UnixStream::connect(&self.path).await {
                Ok(stream) => {
                    debug!(uri = %self.uri(), "Reconnected to event publisher");
                    self.stream = Some(stream);
                }
                Err(e) => {
                    debug!(uri = %self.uri(), error = %e, "Reconnect failed");
                    tokio::time::sleep(self.reconnect_interval).await;
                    return Ok(None);
                }
            }
        }

        loop {
            if let Some(event) = decode_frame(&mut self.buffer)? {
                return Ok(Some(event));
            }

            let mut chunk = [0u8; READ_CHUNK];
            let read = match self.stream.as_mut() {
                Some(stream) => stream.read(&mut chunk).await,
                None => return Ok(None),
            };
            match read {
                Ok(0) => return self.disconnected("end of stream").await,
                Ok(n) => self.buffer.extend_from_slice(&chunk[..n]),
                Err(e) => return self.disconnected(&e.to_string()).await,
            }
        }
    }
}

/// Take one complete frame off the front of `buffer`.
///
/// Returns `Ok(None)` when the buffer holds only part of a frame. A frame
/// that cannot be decoded is consumed and reported as malformed.
pub fn decode_frame(buffer: &mut Vec<u8>) -> Result<Option<Event>, BusError> {
    if buffer.is_empty() {
        return Ok(None);
    }

    let mut cursor = Cursor::new(buffer.as_slice());
    match rmp_serde::from_read::<_, IgnoredAny>(&mut cursor) {
        Ok(_) => {}
        Err(e) if is_incomplete(&e) => return Ok(None),
        Err(e) => {
            buffer.clear();
            return Err(BusError::Malformed(e.to_string()));
        }
    }

    let len = cursor.position() as usize;
    let raw: Vec<u8> = buffer.drain(..len).collect();

    let frame: Frame =
        rmp_serde::from_slice(&raw).map_err(|e| BusError::Malformed(e.to_string()))?;
    parse_body(&frame.body.0).map(Some)
}

fn parse_body(body: &[u8]) -> Result<Event, BusError> {
    let split = body
        .windows(TAG_DELIMITER.len())
        .position(|w| w == TAG_DELIMITER)
        .ok_or_else(|| BusError::Malformed("event body has no tag delimiter".to_string()))?;

    let tag = std::str::from_utf8(&body[..split])
        .map_err(|e| BusError::Malformed(format!("tag is not UTF-8: {}", e)))?;
    let data_bytes = &body[split + TAG_DELIMITER.len()..];
    let data: Value = if data_bytes.is_empty() {
        Value::Null
    } else {
        rmp_serde::from_slice(data_bytes)
            .map_err(|e| BusError::Malformed(format!("{}: {}", tag, e)))?
    };

    Ok(Event::from_value(tag, data))
}

fn is_incomplete(error: &rmp_serde::decode::Error) -> bool {
    use rmp_serde::decode::Error;
    match error {
        Error::InvalidMarkerRead(e) | Error::InvalidDataRead(e) => {
            e.kind() == ErrorKind::UnexpectedEof
        }
        _ => false,
    }
}
