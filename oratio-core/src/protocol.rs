//! Line-oriented wire protocol and the channel that emits it.
//!
//! Server→client only; one event per line, newline-terminated:
//!
//! ```text
//! PARTIAL:<space-joined words>
//! RESULT:NUM=<n>,FORMAT=WSE,RECO-DUR=<secs>,INPUT-DUR=<secs>
//! RESULT:WORD=<word>,<start_secs>,<end_secs>
//! RESULT:DONE
//! ```
//!
//! The client→server direction carries raw PCM bytes and never sees a
//! protocol-level error line: failures close the connection, nothing more.

use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::recognizer::{BestPath, RecognizedWord};

/// Rendered in a `RESULT:WORD` line when the recognizer has no printable
/// symbol for a unit, keeping the per-line format parseable.
pub const PLACEHOLDER_WORD: &str = "???";

/// Word id reserved for silence/blank units. Never emitted on the wire.
pub const SILENCE_ID: u32 = 0;

/// One transcription event, immutable once constructed, written exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionEvent {
    /// Best-effort mid-stream hypothesis.
    Partial { text: String },
    /// Final result header: word count, timing diagnostics in seconds.
    Final {
        word_count: usize,
        recognition_secs: f64,
        input_secs: f64,
    },
    /// One timed word of the final alignment.
    Word {
        word: String,
        start_secs: f64,
        end_secs: f64,
    },
    /// End-of-session marker; always the last line of a non-empty session.
    Done,
}

impl TranscriptionEvent {
    /// Build a `Word` event from an aligned word, converting frames to
    /// seconds. `symbol: None` becomes [`PLACEHOLDER_WORD`].
    pub fn word(aligned: &RecognizedWord, seconds_per_frame: f64) -> Self {
        let word = match aligned.symbol.as_deref() {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => PLACEHOLDER_WORD.to_string(),
        };
        TranscriptionEvent::Word {
            word,
            start_secs: aligned.start_frame as f64 * seconds_per_frame,
            end_secs: aligned.end_frame() as f64 * seconds_per_frame,
        }
    }
}

impl fmt::Display for TranscriptionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionEvent::Partial { text } => write!(f, "PARTIAL:{text}"),
            TranscriptionEvent::Final {
                word_count,
                recognition_secs,
                input_secs,
            } => write!(
                f,
                "RESULT:NUM={word_count},FORMAT=WSE,RECO-DUR={recognition_secs},INPUT-DUR={input_secs}"
            ),
            TranscriptionEvent::Word {
                word,
                start_secs,
                end_secs,
            } => write!(f, "RESULT:WORD={word},{start_secs},{end_secs}"),
            TranscriptionEvent::Done => write!(f, "RESULT:DONE"),
        }
    }
}

/// Space-joined partial hypothesis text: silence ids and unprintable symbols
/// are dropped. May be empty (silence-only paths), in which case the session
/// skips the PARTIAL line entirely.
pub fn partial_text(path: &BestPath) -> String {
    let words: Vec<&str> = path
        .words
        .iter()
        .filter(|w| w.id != SILENCE_ID)
        .filter_map(|w| w.symbol.as_deref())
        .filter(|s| !s.is_empty())
        .collect();
    words.join(" ")
}

/// Serializes events onto a session's connection.
///
/// `write` returns `false` on any write failure (peer closed, broken pipe);
/// the owning session must treat that as terminal. Individual writes are
/// never retried.
pub struct ResultChannel<W: Write> {
    sink: W,
}

impl<W: Write> ResultChannel<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn write(&mut self, event: &TranscriptionEvent) -> bool {
        let line = event.to_string();
        debug!(%line, "emitting");
        match writeln!(self.sink, "{line}").and_then(|()| self.sink.flush()) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "write failed, peer gone");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn aligned(id: u32, symbol: Option<&str>, start: u64, len: u64) -> RecognizedWord {
        RecognizedWord {
            id,
            symbol: symbol.map(str::to_string),
            start_frame: start,
            num_frames: len,
        }
    }

    #[test]
    fn partial_line_rendering() {
        let event = TranscriptionEvent::Partial {
            text: "hello world".into(),
        };
        assert_eq!(event.to_string(), "PARTIAL:hello world");
    }

    #[test]
    fn final_line_rendering() {
        let event = TranscriptionEvent::Final {
            word_count: 3,
            recognition_secs: 0.5,
            input_secs: 1.25,
        };
        assert_eq!(
            event.to_string(),
            "RESULT:NUM=3,FORMAT=WSE,RECO-DUR=0.5,INPUT-DUR=1.25"
        );
    }

    #[test]
    fn word_line_converts_frames_to_seconds() {
        let event = TranscriptionEvent::word(&aligned(7, Some("hello"), 100, 50), 0.01);
        assert_eq!(event.to_string(), "RESULT:WORD=hello,1,1.5");
    }

    #[test]
    fn word_without_symbol_uses_placeholder() {
        let event = TranscriptionEvent::word(&aligned(7, None, 0, 10), 0.01);
        assert_eq!(event.to_string(), "RESULT:WORD=???,0,0.1");

        let event = TranscriptionEvent::word(&aligned(7, Some(""), 0, 10), 0.01);
        assert_eq!(event.to_string(), "RESULT:WORD=???,0,0.1");
    }

    #[test]
    fn done_line_rendering() {
        assert_eq!(TranscriptionEvent::Done.to_string(), "RESULT:DONE");
    }

    #[test]
    fn partial_text_skips_silence_and_unprintable_words() {
        let path = BestPath {
            words: vec![
                aligned(SILENCE_ID, Some("<eps>"), 0, 0),
                aligned(1, Some("good"), 0, 0),
                aligned(2, None, 0, 0),
                aligned(3, Some(""), 0, 0),
                aligned(4, Some("morning"), 0, 0),
            ],
        };
        assert_eq!(partial_text(&path), "good morning");
    }

    #[test]
    fn partial_text_of_silence_only_path_is_empty() {
        let path = BestPath {
            words: vec![aligned(SILENCE_ID, None, 0, 0)],
        };
        assert!(partial_text(&path).is_empty());
    }

    #[test]
    fn channel_writes_newline_terminated_lines() {
        let mut buf = Vec::new();
        {
            let mut channel = ResultChannel::new(&mut buf);
            assert!(channel.write(&TranscriptionEvent::Done));
            assert!(channel.write(&TranscriptionEvent::Partial { text: "hi".into() }));
        }
        assert_eq!(buf, b"RESULT:DONE\nPARTIAL:hi\n");
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_returns_false() {
        let mut channel = ResultChannel::new(BrokenSink);
        assert!(!channel.write(&TranscriptionEvent::Done));
    }
}
