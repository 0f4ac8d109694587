//! Completion loops.
//!
//! Both loops share a [`CompletionSession`] and the tool-call round-trip: when
//! the model asks for tools, the assistant turn and the ordered tool responses
//! are appended and the upstream is asked again, at most
//! [`MAX_TOOL_ITERATIONS`](crate::config::MAX_TOOL_ITERATIONS) times.

pub mod completion;
pub mod session;
pub mod sink;
pub mod streaming;

pub use completion::run_completion;
pub use session::CompletionSession;
pub use sink::SseSink;
pub use streaming::{parse_stream, StreamOutcome};
