//! JSON output formatting

use chrono::SecondsFormat;
use serde::Serialize;
use timedhash_core::{TimedHashes, TimingConfig};

/// Downstream view of one window
#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub index: usize,
    /// RFC 3339, absent for empty windows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    pub total_seconds: f64,
    pub records: usize,
}

impl WindowSummary {
    pub fn new(index: usize, window: &TimedHashes, timing: &TimingConfig) -> Self {
        let (starts_at, ends_at) = if window.is_empty() {
            (None, None)
        } else {
            (
                Some(window.starts_at().to_rfc3339_opts(SecondsFormat::Nanos, true)),
                Some(window.ends_at(timing).to_rfc3339_opts(SecondsFormat::Nanos, true)),
            )
        };

        Self {
            index,
            starts_at,
            ends_at,
            total_seconds: window.total_seconds(timing),
            records: window.len(),
        }
    }
}

/// Summary printed by `thaggregate`
#[derive(Debug, Serialize)]
pub struct AggregateOutput {
    pub status: &'static str,
    pub stream_id: String,
    pub input_segments: usize,
    pub input_records: usize,
    pub target_length_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub num_windows: usize,
    pub windows: Vec<WindowSummary>,
}

impl AggregateOutput {
    pub fn new(
        stream_id: String,
        inputs: &[TimedHashes],
        windows: &[TimedHashes],
        timing: &TimingConfig,
        target_length_s: f64,
    ) -> Self {
        let summaries: Vec<WindowSummary> = windows
            .iter()
            .enumerate()
            .map(|(i, w)| WindowSummary::new(i, w, timing))
            .collect();

        Self {
            status: "success",
            stream_id,
            input_segments: inputs.len(),
            input_records: inputs.iter().map(|s| s.len()).sum(),
            target_length_s,
            output_file: None,
            num_windows: summaries.len(),
            windows: summaries,
        }
    }
}

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}
