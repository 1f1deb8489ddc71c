//! Server settings (JSON file, all fields optional).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use oratio_core::session::BASE_FRAME_SECS;
use oratio_core::SessionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub sample_rate: u32,
    pub chunk_secs: f32,
    pub packet_bytes: usize,
    pub frame_subsampling_factor: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5010,
            workers: 1,
            sample_rate: 16_000,
            chunk_secs: 0.18,
            packet_bytes: 512,
            frame_subsampling_factor: 1,
        }
    }
}

impl ServerSettings {
    pub fn normalize(&mut self) {
        if self.host.trim().is_empty() {
            self.host = "0.0.0.0".into();
        }
        self.workers = self.workers.clamp(1, 512);
        self.sample_rate = self.sample_rate.clamp(8_000, 48_000);
        // chunk_secs <= 0 is meaningful (whole-stream decode), only cap it
        self.chunk_secs = self.chunk_secs.min(10.0);
        // rounded down to whole 16-bit samples
        self.packet_bytes = self.packet_bytes.clamp(2, 1 << 20) & !1;
        self.frame_subsampling_factor = self.frame_subsampling_factor.clamp(1, 10);
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            sample_rate: self.sample_rate,
            chunk_secs: self.chunk_secs,
            packet_bytes: self.packet_bytes,
            seconds_per_frame: BASE_FRAME_SECS * f64::from(self.frame_subsampling_factor),
        }
    }
}

pub fn load_settings(path: &Path) -> ServerSettings {
    let mut settings = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<ServerSettings>(&raw).ok())
        .unwrap_or_default();
    settings.normalize();
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings(Path::new("/nonexistent/oratio-settings.json"));
        assert_eq!(settings.port, 5010);
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.sample_rate, 16_000);
    }

    #[test]
    fn partial_file_fills_in_defaults_and_clamps() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"port": 6000, "workers": 0, "sampleRate": 96000}}"#)
            .expect("write settings");

        let settings = load_settings(file.path());
        assert_eq!(settings.port, 6000);
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.sample_rate, 48_000);
        assert_eq!(settings.chunk_secs, 0.18);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json at all").expect("write settings");

        let settings = load_settings(file.path());
        assert_eq!(settings.port, 5010);
    }

    #[test]
    fn odd_packet_bytes_rounds_down_to_whole_samples() {
        let mut settings = ServerSettings {
            packet_bytes: 513,
            ..ServerSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.packet_bytes, 512);
    }

    #[test]
    fn session_config_applies_frame_subsampling() {
        let settings = ServerSettings {
            frame_subsampling_factor: 3,
            ..ServerSettings::default()
        };
        let config = settings.session_config();
        assert!((config.seconds_per_frame - 0.03).abs() < 1e-12);
    }
}
