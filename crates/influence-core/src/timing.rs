//! Per-stage wall-clock timings for one pipeline run.
//!
//! Recording is opt-in: a disabled [`StageTimings`] runs closures without
//! touching the clock.

use std::time::{Duration, Instant};

use serde_json::json;

/// Environment variable that turns timing on (`1`, `true`, `yes`, `on`).
pub const ENV_TIMING: &str = "INFLUENCE_TIMING";

/// Duration of one named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: &'static str,
    pub elapsed: Duration,
}

/// Ordered stage timings collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTimings {
    enabled: bool,
    stages: Vec<StageTiming>,
}

/// Returns true when `INFLUENCE_TIMING` enables timing collection.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(ENV_TIMING)
        .ok()
        .is_some_and(|value| is_truthy(value.as_str()))
}

impl StageTimings {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stages: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f`, recording its duration under `name` when enabled.
    pub fn time<R>(&mut self, name: &'static str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }

        let started = Instant::now();
        let result = f();
        self.stages.push(StageTiming {
            name,
            elapsed: started.elapsed(),
        });
        result
    }

    #[must_use]
    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of all recorded stages.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|stage| stage.elapsed).sum()
    }

    /// Render as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "name": stage.name,
                    "elapsed_us": stage.elapsed.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Render as a simple table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("stage                elapsed\n");
        out.push_str("----------------------------\n");
        for stage in &self.stages {
            out.push_str(&format!(
                "{:<16} {:>11}\n",
                stage.name,
                format_duration(stage.elapsed)
            ));
        }
        out.push_str(&format!("{:<16} {:>11}\n", "total", format_duration(self.total())));
        out
    }
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
}
