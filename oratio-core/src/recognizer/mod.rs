//! Recognizer abstraction.
//!
//! The `Recognizer` trait is the seam between the session engine and the
//! decoding stack (feature extraction, neural scoring, lattice search, word
//! alignment). The session machine assumes nothing beyond this interface, so
//! backends are swappable without touching the core.
//!
//! `&mut self` throughout intentionally expresses that decoders are stateful —
//! feature buffers, active tokens, adaptation statistics. Each session gets a
//! fresh instance from a `RecognizerFactory`; instances are never shared.

pub mod stub;

pub use stub::{StubRecognizer, StubRecognizerFactory};

use crate::error::Result;

/// One recognized unit in a best-path hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedWord {
    /// Numeric word id. Id `0` is reserved for silence/blank and is never
    /// rendered on the wire.
    pub id: u32,
    /// Printable symbol, if the backend's symbol table has one for this id.
    pub symbol: Option<String>,
    /// First decoded frame of this word. Meaningful only for final paths.
    pub start_frame: u64,
    /// Duration in decoded frames. Meaningful only for final paths.
    pub num_frames: u64,
}

impl RecognizedWord {
    /// End frame (exclusive) of this word.
    pub fn end_frame(&self) -> u64 {
        self.start_frame + self.num_frames
    }
}

/// A best-path hypothesis: the word sequence the decoder currently favors.
///
/// For non-final paths only `id`/`symbol` carry information; frame timing is
/// populated once the lattice has been finalized and word-aligned.
#[derive(Debug, Clone, Default)]
pub struct BestPath {
    pub words: Vec<RecognizedWord>,
}

/// Contract for streaming speech recognition backends.
///
/// Call order within one session:
/// `accept_samples`* → `advance_decoding` → (`best_path(false)`)* →
/// `input_finished` → `advance_decoding` → `finalize_decoding` →
/// `best_path(true)`.
pub trait Recognizer: Send {
    /// Feed a block of mono samples in [-1.0, 1.0] at the given rate.
    /// Cheap; buffers into the feature pipeline without decoding.
    fn accept_samples(&mut self, sample_rate: u32, samples: &[f32]);

    /// Run one incremental decoding step over all buffered features.
    fn advance_decoding(&mut self) -> Result<()>;

    /// Number of frames decoded so far.
    fn num_frames_decoded(&self) -> u64;

    /// Current best-path hypothesis. `is_final` requests the word-aligned
    /// path with per-word frame timing; only valid after
    /// `finalize_decoding`.
    fn best_path(&mut self, is_final: bool) -> Result<BestPath>;

    /// Signal that no further samples will arrive.
    fn input_finished(&mut self);

    /// Finalize the search (prune, word-align). Called once, after
    /// `input_finished` and a last `advance_decoding`.
    fn finalize_decoding(&mut self) -> Result<()>;
}

/// Builds one `Recognizer` per session.
///
/// Implementations hold the process-wide read-only model state (acoustic
/// model, decoding graph, lexicon, symbol table) behind `Arc`s and share it
/// into every instance — no per-session copies, no locking.
pub trait RecognizerFactory: Send + Sync {
    fn create_recognizer(&self) -> Box<dyn Recognizer>;
}
