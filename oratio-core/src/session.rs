//! Session state machine — chunked decode cadence.
//!
//! ## Per-iteration flow
//!
//! ```text
//! 1. Read one packet of PCM bytes (short/zero read ⇒ end-of-stream)
//! 2. Feed samples to the recognizer's feature input (always, even trailing)
//! 3. Below one decode chunk of unprocessed audio? → read again
//! 4. Otherwise advance decoding once (amortizes decode cost per chunk)
//! 5. ≥ 0.3 s of new audio and frames decoded? → emit a PARTIAL line
//! 6. On end-of-stream: finalize, emit RESULT:NUM / RESULT:WORD* / RESULT:DONE
//! ```
//!
//! A session that never receives a sample writes nothing at all. Any write
//! failure ends the session immediately; the connection is already unusable
//! so no finalization is attempted past that point.

use std::io::{self, Read, Write};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::protocol::{partial_text, ResultChannel, TranscriptionEvent, SILENCE_ID};
use crate::recognizer::Recognizer;

/// Seconds of new audio required between partial emissions.
const PARTIAL_INTERVAL_SECS: f32 = 0.3;

/// Duration of one decoded frame before frame subsampling (10 ms).
pub const BASE_FRAME_SECS: f64 = 0.01;

/// Per-session knobs, fixed at server startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Wire sample rate in Hz. Fixed by configuration, not negotiated.
    pub sample_rate: u32,
    /// Decode chunk duration in seconds. `<= 0` treats the entire stream as
    /// one chunk: no streaming partials, only a final result.
    pub chunk_secs: f32,
    /// Read granularity from the connection in bytes. Rounded down to a
    /// whole number of 16-bit samples so packets never split a sample.
    pub packet_bytes: usize,
    /// `BASE_FRAME_SECS * frame_subsampling_factor`, derived once at startup.
    pub seconds_per_frame: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            chunk_secs: 0.18,
            packet_bytes: 512,
            seconds_per_frame: BASE_FRAME_SECS,
        }
    }
}

impl SessionConfig {
    /// Samples accumulated before one decode-advance step.
    pub fn chunk_samples(&self) -> usize {
        if self.chunk_secs > 0.0 {
            ((self.sample_rate as f32 * self.chunk_secs) as usize).max(1)
        } else {
            usize::MAX
        }
    }

    fn partial_gate_samples(&self) -> usize {
        (PARTIAL_INTERVAL_SECS * self.sample_rate as f32) as usize
    }
}

/// How a session ended. All variants are contained at the worker boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Peer connected and disconnected without sending audio; no lines written.
    NoAudio,
    /// Final result and DONE line written.
    Completed { word_count: usize },
    /// A write failed mid-session; the peer is gone.
    PeerGone,
    /// The recognizer reported an error; the session was abandoned.
    RecognizerFailed,
}

/// Run one session to completion: drain the sample stream from `reader`,
/// drive the recognizer on the chunk cadence, emit events on `writer`.
pub fn run<R: Read, W: Write>(
    config: &SessionConfig,
    recognizer: &mut dyn Recognizer,
    reader: &mut R,
    writer: W,
) -> SessionOutcome {
    let chunk_samples = config.chunk_samples();
    let partial_gate = config.partial_gate_samples();
    let mut channel = ResultChannel::new(writer);
    // Whole samples per packet: an odd packet size would leave every
    // subsequent read starting mid-sample.
    let mut packet = vec![0u8; config.packet_bytes.max(2) & !1];
    let started = Instant::now();

    let mut received: usize = 0;
    let mut processed: usize = 0;
    let mut partial_mark: usize = 0;

    loop {
        let n = read_packet(reader, &mut packet);
        let more = n == packet.len();

        let samples = pcm_to_f32(&packet[..n]);
        recognizer.accept_samples(config.sample_rate, &samples);
        received += samples.len();

        if more && received - processed < chunk_samples {
            continue;
        }
        processed = received;
        if let Err(e) = recognizer.advance_decoding() {
            warn!(error = %e, "advance_decoding failed");
            return SessionOutcome::RecognizerFailed;
        }

        if received - partial_mark >= partial_gate && recognizer.num_frames_decoded() > 0 {
            partial_mark = received;
            let path = match recognizer.best_path(false) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "partial best_path failed");
                    return SessionOutcome::RecognizerFailed;
                }
            };
            let text = partial_text(&path);
            if !text.is_empty() && !channel.write(&TranscriptionEvent::Partial { text }) {
                return SessionOutcome::PeerGone;
            }
        }

        if !more {
            break;
        }
    }

    if received == 0 {
        debug!("no audio received, closing without output");
        return SessionOutcome::NoAudio;
    }

    recognizer.input_finished();
    if let Err(e) = recognizer.advance_decoding() {
        warn!(error = %e, "final advance_decoding failed");
        return SessionOutcome::RecognizerFailed;
    }
    if let Err(e) = recognizer.finalize_decoding() {
        warn!(error = %e, "finalize_decoding failed");
        return SessionOutcome::RecognizerFailed;
    }
    let path = match recognizer.best_path(true) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "final best_path failed");
            return SessionOutcome::RecognizerFailed;
        }
    };

    let words: Vec<_> = path.words.iter().filter(|w| w.id != SILENCE_ID).collect();
    let header = TranscriptionEvent::Final {
        word_count: words.len(),
        recognition_secs: started.elapsed().as_secs_f64(),
        input_secs: received as f64 / f64::from(config.sample_rate),
    };
    if !channel.write(&header) {
        return SessionOutcome::PeerGone;
    }
    for word in &words {
        if !channel.write(&TranscriptionEvent::word(word, config.seconds_per_frame)) {
            return SessionOutcome::PeerGone;
        }
    }
    if !channel.write(&TranscriptionEvent::Done) {
        return SessionOutcome::PeerGone;
    }

    info!(
        word_count = words.len(),
        received_samples = received,
        "session completed"
    );
    SessionOutcome::Completed {
        word_count: words.len(),
    }
}

/// Fill `buf` from the reader. Returns the number of bytes read; anything
/// short of a full packet means end-of-stream. Read errors other than
/// `Interrupted` are treated the same way — finalization still runs, and if
/// the peer is truly gone the result writes fail instead.
fn read_packet<R: Read>(reader: &mut R, buf: &mut [u8]) -> usize {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, "read failed, treating as end-of-stream");
                break;
            }
        }
    }
    filled
}

/// Decode 16-bit little-endian PCM into mono f32 in [-1.0, 1.0].
/// A trailing odd byte cannot form a sample and is dropped.
fn pcm_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect()
}
