//! 流水线处理模块：把上游字节流解码为 SSE 行、数据帧与完整的工具调用。
//!
//! # Streaming Pipeline
//!
//! The inner parser of the streaming completion loop, split into small pieces
//! that can be driven chunk by chunk and tested without a network.
//!
//! ```text
//! Raw Bytes → Utf8Decoder → SseLineDecoder → classify_line → try_parse_frame
//!                                                               │
//!                                        content / reasoning ◄──┴──► ToolCallAccumulator
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Incremental UTF-8 decoding, line buffering, `data:` classification |
//! | [`frame`] | Defensive chunk parsing into [`StreamFrame`] |
//! | [`accumulate`] | Index-keyed merge of tool-call deltas |

pub mod accumulate;
pub mod decode;
pub mod frame;

pub use accumulate::ToolCallAccumulator;
pub use decode::{classify_line, SseLine, SseLineDecoder, Utf8Decoder, DONE_SENTINEL};
pub use frame::{try_parse_frame, StreamFrame};
