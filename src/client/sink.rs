//! Writer half of the client-facing event stream.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::types::ClientEvent;
use crate::{Error, Result};

/// Frames buffered between the producer task and the HTTP body.
pub const SINK_BUFFER: usize = 64;

/// Producer side of the SSE channel.
///
/// The HTTP layer owns the receiver. Closing consumes the sink, so the stream
/// can only be closed once; dropping it closes it as well.
#[derive(Debug)]
pub struct SseSink {
    tx: mpsc::Sender<Bytes>,
    frames_sent: usize,
}

impl SseSink {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx, frames_sent: 0 }, rx)
    }

    pub async fn send(&mut self, event: ClientEvent) -> Result<()> {
        self.send_raw(event.to_frame()).await
    }

    /// Fails with [`Error::ClientDisconnected`] once the reader is gone.
    pub async fn send_raw(&mut self, frame: Bytes) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| Error::ClientDisconnected)?;
        self.frames_sent += 1;
        Ok(())
    }

    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn close(self) {
        drop(self.tx);
    }
}
