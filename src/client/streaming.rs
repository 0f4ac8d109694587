//! Streaming completion loop.
//!
//! A detached producer task drives the upstream SSE stream and writes client
//! frames into an [`SseSink`]; the HTTP response only reads the other end.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn, Instrument};

use super::session::CompletionSession;
use super::sink::{SseSink, SINK_BUFFER};
use crate::pipeline::{classify_line, try_parse_frame, SseLine, SseLineDecoder, ToolCallAccumulator};
use crate::transport::{error_from_response, TransportError};
use crate::types::{ChatMessage, ClientEvent, ToolCall};
use crate::{ByteStream, Error, Result};

/// Shown to the client when the producer fails for a reason other than an
/// upstream error status.
pub const STREAM_ERROR_MESSAGE: &str = "An error occurred while streaming the response";

/// State reported by the inner parser once the upstream body ends.
#[derive(Debug, Default)]
pub struct StreamOutcome {
    pub finish_reason: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    /// Raw arguments of the first tool call, used as the search preview.
    pub first_arguments: Option<String>,
    /// Content streamed before tool calls started, kept for the transcript.
    pub content: String,
}

struct InnerParser {
    accumulator: ToolCallAccumulator,
    finish_reason: Option<String>,
    content: String,
}

impl InnerParser {
    fn new() -> Self {
        Self {
            accumulator: ToolCallAccumulator::new(),
            finish_reason: None,
            content: String::new(),
        }
    }

    fn tool_call_in_progress(&self) -> bool {
        !self.accumulator.is_empty()
    }

    async fn line(&mut self, line: &str, sink: &mut SseSink) -> Result<()> {
        match classify_line(line) {
            SseLine::Ignored => Ok(()),
            SseLine::Done => {
                if !self.tool_call_in_progress() {
                    sink.send(ClientEvent::Done).await?;
                }
                Ok(())
            }
            SseLine::Data(payload) => {
                let Some(frame) = try_parse_frame(payload) else {
                    return Ok(());
                };
                if frame.finish_reason.is_some() {
                    self.finish_reason = frame.finish_reason.clone();
                }
                if !frame.tool_calls.is_empty() {
                    self.accumulator.extend(&frame.tool_calls);
                    return Ok(());
                }
                if self.tool_call_in_progress() || !frame.is_forwardable() {
                    return Ok(());
                }
                if let Some(text) = &frame.content {
                    self.content.push_str(text);
                }
                sink.send(ClientEvent::Forward(payload.to_string())).await
            }
        }
    }

    fn finish(self) -> StreamOutcome {
        let first_arguments = self.accumulator.first_arguments().map(str::to_string);
        StreamOutcome {
            finish_reason: self.finish_reason,
            tool_calls: self.accumulator.finalize(),
            first_arguments,
            content: self.content,
        }
    }
}

/// Inner byte-stream parser: runs once per upstream response.
pub async fn parse_stream<S, E>(mut body: S, sink: &mut SseSink) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Into<Error>,
{
    let mut decoder = SseLineDecoder::new();
    let mut parser = InnerParser::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return Err(e.into()),
        };
        for line in decoder.push(&chunk) {
            parser.line(&line, sink).await?;
        }
    }
    if let Some(rest) = decoder.finish() {
        parser.line(&rest, sink).await?;
    }

    Ok(parser.finish())
}

/// Outer loop: stream, run tools, stream again.
///
/// An upstream error status becomes one error frame and ends the loop. Running
/// out of iterations just ends it: the response status is already committed.
pub async fn drive(
    session: &CompletionSession,
    mut messages: Vec<ChatMessage>,
    sink: &mut SseSink,
) -> Result<()> {
    for iteration in 1..=session.max_iterations {
        let body = session.build_request(&messages, true);
        let resp = session.upstream.send(&body).await?;

        if !resp.status().is_success() {
            let err = error_from_response(resp).await;
            warn!(iteration, error = %err, "upstream rejected streaming request");
            let message = match err {
                Error::Remote { message, .. } => message,
                other => other.to_string(),
            };
            sink.send(ClientEvent::Error { message }).await?;
            return Ok(());
        }

        let body = resp.bytes_stream().map(|r| r.map_err(TransportError::from));
        let outcome = parse_stream(Box::pin(body), sink).await?;

        if outcome.tool_calls.is_empty() {
            debug!(iteration, finish_reason = ?outcome.finish_reason, "stream finished");
            return Ok(());
        }

        info!(iteration, tool_calls = outcome.tool_calls.len(), "executing streamed tool calls");
        sink.send(ClientEvent::Searching {
            query: outcome.first_arguments.clone().unwrap_or_default(),
        })
        .await?;

        let responses = session.tools.execute_all(&outcome.tool_calls).await;
        sink.send(ClientEvent::SearchComplete {
            result_count: responses.len(),
        })
        .await?;

        let content = Some(outcome.content).filter(|c| !c.is_empty());
        messages.push(ChatMessage::assistant_tool_calls(content, outcome.tool_calls));
        messages.extend(responses);
    }

    warn!(limit = session.max_iterations, "tool loop did not converge, closing stream");
    Ok(())
}

/// Start the producer task and return the body the HTTP layer should serve.
pub fn spawn(session: CompletionSession, messages: Vec<ChatMessage>) -> ByteStream {
    let (mut sink, rx) = SseSink::channel(SINK_BUFFER);

    let task = async move {
        match drive(&session, messages, &mut sink).await {
            Ok(()) => {}
            Err(Error::ClientDisconnected) => {
                debug!("client went away, stopping stream producer");
            }
            Err(e) => {
                error!(error = %e, "streaming completion failed");
                let _ = sink
                    .send(ClientEvent::Error {
                        message: STREAM_ERROR_MESSAGE.to_string(),
                    })
                    .await;
            }
        }
        debug!(frames = sink.frames_sent(), "closing client stream");
        sink.close();
    };
    tokio::spawn(task.in_current_span());

    Box::pin(ReceiverStream::new(rx).map(Ok))
}
