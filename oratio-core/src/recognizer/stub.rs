//! `StubRecognizer` — placeholder backend with no real decoding.
//!
//! Lets the server binary and end-to-end tests exercise the full
//! dispatch/session/wire path before a real engine is plugged in behind the
//! `Recognizer` trait. Produces a deterministic hypothesis: one word per
//! whole second of received audio, each spanning that second's frames.

use tracing::debug;

use crate::error::Result;
use crate::recognizer::{BestPath, RecognizedWord, Recognizer, RecognizerFactory};

/// Frame stride of the stub "decoder": 10 ms of audio per frame.
const SAMPLES_PER_FRAME_DIVISOR: u32 = 100;

/// Deterministic echo-style recognizer.
pub struct StubRecognizer {
    sample_rate: Option<u32>,
    samples_accepted: u64,
    frames_decoded: u64,
    finalized: bool,
}

impl StubRecognizer {
    pub fn new() -> Self {
        Self {
            sample_rate: None,
            samples_accepted: 0,
            frames_decoded: 0,
            finalized: false,
        }
    }

    fn frames_per_second(&self) -> u64 {
        u64::from(SAMPLES_PER_FRAME_DIVISOR)
    }

    fn word_count(&self) -> u64 {
        self.frames_decoded / self.frames_per_second()
    }
}

impl Default for StubRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for StubRecognizer {
    fn accept_samples(&mut self, sample_rate: u32, samples: &[f32]) {
        self.sample_rate.get_or_insert(sample_rate);
        self.samples_accepted += samples.len() as u64;
    }

    fn advance_decoding(&mut self) -> Result<()> {
        if let Some(rate) = self.sample_rate {
            let samples_per_frame = u64::from(rate / SAMPLES_PER_FRAME_DIVISOR).max(1);
            self.frames_decoded = self.samples_accepted / samples_per_frame;
        }
        Ok(())
    }

    fn num_frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    fn best_path(&mut self, is_final: bool) -> Result<BestPath> {
        let per_word = self.frames_per_second();
        let words = (0..self.word_count())
            .map(|i| RecognizedWord {
                id: (i + 1) as u32,
                symbol: Some(format!("stub{}", i + 1)),
                start_frame: if is_final { i * per_word } else { 0 },
                num_frames: if is_final { per_word } else { 0 },
            })
            .collect();
        Ok(BestPath { words })
    }

    fn input_finished(&mut self) {
        debug!(
            samples = self.samples_accepted,
            "StubRecognizer::input_finished"
        );
    }

    fn finalize_decoding(&mut self) -> Result<()> {
        self.finalized = true;
        Ok(())
    }
}

/// Factory producing fresh `StubRecognizer`s. Carries no model state.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubRecognizerFactory;

impl RecognizerFactory for StubRecognizerFactory {
    fn create_recognizer(&self) -> Box<dyn Recognizer> {
        Box::new(StubRecognizer::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_words_before_a_full_second_of_audio() {
        let mut r = StubRecognizer::new();
        r.accept_samples(16_000, &vec![0.0; 8_000]);
        r.advance_decoding().unwrap();
        assert_eq!(r.num_frames_decoded(), 50);
        assert!(r.best_path(false).unwrap().words.is_empty());
    }

    #[test]
    fn one_word_per_second_with_final_timing() {
        let mut r = StubRecognizer::new();
        r.accept_samples(16_000, &vec![0.0; 32_000]);
        r.advance_decoding().unwrap();
        r.input_finished();
        r.finalize_decoding().unwrap();

        let path = r.best_path(true).unwrap();
        assert_eq!(path.words.len(), 2);
        assert_eq!(path.words[0].symbol.as_deref(), Some("stub1"));
        assert_eq!(path.words[0].start_frame, 0);
        assert_eq!(path.words[1].start_frame, 100);
        assert_eq!(path.words[1].end_frame(), 200);
    }

    #[test]
    fn partial_path_has_no_timing() {
        let mut r = StubRecognizer::new();
        r.accept_samples(16_000, &vec![0.0; 16_000]);
        r.advance_decoding().unwrap();

        let path = r.best_path(false).unwrap();
        assert_eq!(path.words.len(), 1);
        assert_eq!(path.words[0].num_frames, 0);
    }
}
