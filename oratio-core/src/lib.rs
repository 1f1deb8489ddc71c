//! # oratio-core
//!
//! Streaming speech-transcription server engine.
//!
//! ## Architecture
//!
//! ```text
//! TcpListener → Listener.accept() → WorkerPool.dispatch(conn)
//!                                         │
//!                                   Worker thread (one of N, slot lock held)
//!                                         │
//!                                   session::run — packet reads → decode cadence
//!                                         │
//!                            Recognizer::advance_decoding / best_path
//!                                         │
//!                            ResultChannel — PARTIAL:/RESULT: lines → client
//! ```
//!
//! One OS thread per worker, blocking I/O throughout. A connection is either
//! bound to a free worker at accept time or closed immediately; nothing queues.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod listener;
pub mod pool;
pub mod protocol;
pub mod recognizer;
pub mod server;
pub mod session;

// Convenience re-exports for downstream crates
pub use error::OratioError;
pub use listener::Listener;
pub use pool::WorkerPool;
pub use protocol::{ResultChannel, TranscriptionEvent};
pub use recognizer::{BestPath, RecognizedWord, Recognizer, RecognizerFactory};
pub use server::Server;
pub use session::{SessionConfig, SessionOutcome};
