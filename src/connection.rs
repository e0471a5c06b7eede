//! A single TCP connection as a [`CommandTarget`].
//!
//! Two tasks own the socket. The writer takes calls off an unbounded queue,
//! hands each reply slot to the reader in write order and writes the
//! request; calls already queued are written in the same batch. The reader
//! pairs each incoming reply with the oldest slot. A connection error fails
//! every slot still waiting and closes the connection to new calls.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use crate::call::{Completion, CommandCall, ExecutionContext};
use crate::config::ClientConfig;
use crate::error::{CallError, Result};
use crate::resp::RespReader;
use crate::target::CommandTarget;

/// Handle to a connection; clones share the socket.
#[derive(Clone)]
pub struct Connection {
    calls: mpsc::UnboundedSender<CommandCall>,
    context: ExecutionContext,
    peer: Arc<str>,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(&config.addr))
            .await
            .map_err(|_| {
                CallError::Transport(format!(
                    "connect to {} timed out after {:?}",
                    config.addr, config.connect_timeout
                ))
            })??;
        stream.set_nodelay(config.nodelay)?;
        tracing::debug!("Connected to {}", config.addr);
        Ok(Self::from_stream(stream, &config.addr))
    }

    /// Drive an already established byte stream.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn from_stream<S>(stream: S, peer: &str) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let context = ExecutionContext::current();
        let peer: Arc<str> = Arc::from(peer);
        let (calls_tx, calls_rx) = mpsc::unbounded_channel();
        let (slots_tx, slots_rx) = mpsc::unbounded_channel();
        let (abort_tx, abort_rx) = oneshot::channel();
        let (reader, writer) = tokio::io::split(stream);

        context
            .handle()
            .spawn(write_loop(writer, calls_rx, slots_tx, abort_tx, peer.clone()));
        context
            .handle()
            .spawn(read_loop(reader, slots_rx, abort_rx, peer.clone()));

        Self {
            calls: calls_tx,
            context,
            peer,
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// True once the connection stopped accepting calls. Set by the
    /// connection tasks as soon as the socket fails, no further call needed.
    pub fn is_closed(&self) -> bool {
        self.calls.is_closed()
    }
}

impl CommandTarget for Connection {
    fn enqueue(&self, call: CommandCall) {
        if let Err(mpsc::error::SendError(call)) = self.calls.send(call) {
            call.fail(CallError::Transport(format!(
                "connection to {} is closed",
                self.peer
            )));
        }
    }

    fn context(&self) -> &ExecutionContext {
        &self.context
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn write_loop<S: AsyncWrite>(
    mut writer: WriteHalf<S>,
    mut calls: mpsc::UnboundedReceiver<CommandCall>,
    slots: mpsc::UnboundedSender<Completion>,
    abort: oneshot::Sender<CallError>,
    peer: Arc<str>,
) {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        let received = tokio::select! {
            call = calls.recv() => Ok(call),
            _ = slots.closed() => Err(()),
        };
        let call = match received {
            Ok(Some(call)) => call,
            Ok(None) => break,
            Err(()) => {
                tracing::debug!("Reader for {} stopped, writer exiting", peer);
                fail_queued(&mut calls, &peer);
                return;
            }
        };

        let mut next = Some(call);
        while let Some(call) = next {
            tracing::trace!("{} <- {}", peer, call.name());
            call.encode_into(&mut buf);
            let (_, slot) = call.into_parts();
            if let Err(mpsc::error::SendError(slot)) = slots.send(slot) {
                // reader is gone, so is the socket
                fail_queued(&mut calls, &peer);
                slot.fail(CallError::Transport(format!("connection to {} is closed", peer)));
                return;
            }
            next = calls.try_recv().ok();
        }

        let written = match writer.write_all(&buf).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        buf.clear();

        if let Err(e) = written {
            tracing::warn!("Write to {} failed: {}", peer, e);
            fail_queued(&mut calls, &peer);
            let _ = abort.send(CallError::from(e));
            return;
        }
    }

    tracing::debug!("All handles to {} dropped, writer exiting", peer);
}

async fn read_loop<S: AsyncRead + Send>(
    reader: ReadHalf<S>,
    mut slots: mpsc::UnboundedReceiver<Completion>,
    mut abort: oneshot::Receiver<CallError>,
    peer: Arc<str>,
) {
    let mut reader = RespReader::new(reader);
    let mut writer_alive = true;

    'conn: loop {
        // One read is always outstanding, even with nothing pending, so a
        // hangup is noticed while idle. It is never restarted: a partial
        // reply must not be dropped.
        let read = reader.read_reply();
        tokio::pin!(read);
        let mut slot = None;

        let reply = loop {
            tokio::select! {
                next = slots.recv(), if slot.is_none() => match next {
                    Some(next) => slot = Some(next),
                    None => break 'conn,
                },
                reply = &mut read => break reply.map_err(CallError::from),
                aborted = &mut abort, if writer_alive => match aborted {
                    Ok(error) => break Err(error),
                    // writer finished cleanly, replies still owed
                    Err(_) => writer_alive = false,
                },
            }
        };

        let error = match (reply, slot.take()) {
            (Ok(Some(value)), Some(slot)) => {
                if slot.is_abandoned() {
                    tracing::trace!("{} -> reply discarded, caller stopped waiting", peer);
                } else {
                    tracing::trace!("{} -> reply", peer);
                }
                slot.succeed(value);
                continue;
            }
            (Ok(Some(value)), None) => {
                CallError::Transport(format!("unsolicited reply from {}: {:?}", peer, value))
            }
            (Ok(None), pending) => {
                slot = pending;
                CallError::Transport(format!("connection closed by {}", peer))
            }
            (Err(e), pending) => {
                slot = pending;
                e
            }
        };

        tracing::warn!("Connection to {} failed: {}", peer, error);
        // close first so the writer stops accepting calls before anyone
        // observes the failure
        slots.close();
        if let Some(slot) = slot {
            slot.fail(error.clone());
        }
        while let Some(slot) = slots.recv().await {
            slot.fail(error.clone());
        }
        return;
    }

    tracing::debug!("Reader for {} exiting", peer);
}

fn fail_queued(calls: &mut mpsc::UnboundedReceiver<CommandCall>, peer: &str) {
    calls.close();
    while let Ok(call) = calls.try_recv() {
        call.fail(CallError::Transport(format!("connection to {} is closed", peer)));
    }
}
