use crate::protocol::{Endpoint, FrameBuffer, Message, ProtocolError};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

fn hangup() -> ProtocolError {
    io::Error::new(io::ErrorKind::UnexpectedEof, "websocket closed").into()
}

/// Reads protocol messages out of the binary messages of a WebSocket.
#[derive(Debug)]
pub struct FrameReader<R> {
    stream: R,
    frames: FrameBuffer,
}

impl<R> FrameReader<R>
where
    R: Stream<Item = Result<websocket::Message, websocket::Error>> + Unpin,
{
    pub fn new(stream: R, receiver: Endpoint) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(receiver),
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Waits for the next complete message. A closed socket is reported as
    /// an end-of-file error, see `ProtocolError::is_eof`.
    pub async fn read_message(&mut self) -> Result<Message, ProtocolError> {
        loop {
            if let Some(msg) = self.frames.next_message()? {
                return Ok(msg);
            }
            match self.stream.next().await {
                Some(Ok(ws)) if ws.is_binary() => self.frames.extend(ws.as_payload()),
                Some(Ok(ws)) if ws.is_close() => break,
                Some(Ok(_)) => continue,
                Some(Err(err)) => return Err(err.into()),
                None => break,
            }
        }
        if !self.frames.is_empty() {
            debug!("socket closed mid-frame");
        }
        Err(hangup())
    }
}

/// Drains `frames` into `sink` until every `Outbox` is dropped, then closes
/// the socket. Frames queued together go out as one binary message, which
/// must be sent within `deadline`.
pub async fn run_writer<W>(mut sink: W, mut frames: mpsc::Receiver<Vec<u8>>, deadline: Duration) -> Result<(), ProtocolError>
where
    W: Sink<websocket::Message, Error = websocket::Error> + Unpin,
{
    while let Some(mut batch) = frames.recv().await {
        while let Ok(next) = frames.try_recv() {
            batch.extend_from_slice(&next);
        }
        tokio::time::timeout(deadline, sink.send(websocket::Message::binary(batch)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "write deadline exceeded"))??;
    }
    sink.close().await?;
    Ok(())
}
