//! One client connection
//!
//! Every received chunk is stored with a single write; when it completes a
//! line, the whole log as of that write is sent back. Control lines are
//! answered with the log from the requested record on and are never stored.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::ring::{CommandPosition, RingError};

use super::errors::{ServerError, ServerResult};
use super::framing::{could_be_control, parse_control};
use super::sink::Session;

/// Per-connection state
pub struct Connection {
    id: Uuid,
    peer: SocketAddr,
    stream: TcpStream,
    session: Session,
    recv_buffer_bytes: usize,
    /// Start of a line held back because it may be a control line
    held: Vec<u8>,
    /// Next byte begins a new line
    at_line_start: bool,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        session: Session,
        recv_buffer_bytes: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer,
            stream,
            session,
            recv_buffer_bytes,
            held: Vec::new(),
            at_line_start: true,
        }
    }

    /// Serve the client until it disconnects
    pub async fn run(mut self) -> ServerResult<()> {
        let id = self.id.to_string();
        let peer = self.peer.to_string();
        log_event_with_fields(
            Event::ConnectionAccepted,
            &[("connection", id.as_str()), ("peer", peer.as_str())],
        );

        let result = self.serve().await;

        match &result {
            Ok(()) => log_event_with_fields(
                Event::ConnectionClosed,
                &[("connection", id.as_str()), ("peer", peer.as_str())],
            ),
            Err(e) => log_event_with_fields(
                Event::ConnectionFailed,
                &[
                    ("connection", id.as_str()),
                    ("error", e.to_string().as_str()),
                    ("peer", peer.as_str()),
                ],
            ),
        }

        result
    }

    async fn serve(&mut self) -> ServerResult<()> {
        let mut buf = vec![0u8; self.recv_buffer_bytes];

        loop {
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.handle_chunk(&buf[..n]).await?;
        }

        if !self.held.is_empty() {
            let rest = std::mem::take(&mut self.held);
            self.session.append(&rest).await?;
        }

        Ok(())
    }

    /// Store a received chunk in as few writes as possible.
    ///
    /// Only a line start that may still be a control line is held back; a
    /// control line splits the chunk around it.
    async fn handle_chunk(&mut self, chunk: &[u8]) -> ServerResult<()> {
        if !self.session.supports_seek() {
            return self.store(chunk).await;
        }

        let mut data = Vec::with_capacity(chunk.len());
        let mut rest = chunk;

        while !rest.is_empty() {
            let (piece, complete) = match rest.iter().position(|&b| b == b'\n') {
                Some(i) => (&rest[..=i], true),
                None => (rest, false),
            };
            rest = &rest[piece.len()..];

            if !self.at_line_start {
                data.extend_from_slice(piece);
                self.at_line_start = complete;
                continue;
            }

            self.held.extend_from_slice(piece);

            if complete {
                let line = std::mem::take(&mut self.held);
                match parse_control(&line) {
                    Some(position) => {
                        let before = std::mem::take(&mut data);
                        self.store(&before).await?;
                        self.answer_control(position).await?;
                    }
                    None => data.extend_from_slice(&line),
                }
            } else if !could_be_control(&self.held) {
                data.append(&mut self.held);
                self.at_line_start = false;
            }
        }

        self.store(&data).await
    }

    /// Write `bytes` in one call, echoing the log when they hold a newline
    async fn store(&mut self, bytes: &[u8]) -> ServerResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if !bytes.contains(&b'\n') {
            return self.session.append(bytes).await;
        }
        let contents = self.session.append_and_read(bytes).await?;
        self.send(&contents).await
    }

    async fn answer_control(&mut self, position: CommandPosition) -> ServerResult<()> {
        match self.session.contents_from(position).await {
            Ok(Some(contents)) => self.send(&contents).await,
            Ok(None) => Ok(()),
            Err(ServerError::Ring(RingError::InvalidArgument(reason))) => {
                let id = self.id.to_string();
                log_event_with_fields(
                    Event::SeekRejected,
                    &[("connection", id.as_str()), ("reason", reason.as_str())],
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> ServerResult<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
