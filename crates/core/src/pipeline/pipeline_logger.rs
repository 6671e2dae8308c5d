use std::collections::HashMap;
use std::time::Instant;

/// Observer for clip extraction stages.
///
/// Use cases report through this trait so callers choose where timings and
/// status messages end up.
pub trait PipelineLogger: Send {
    /// Record how long a named stage took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a named value such as the segment count or best score.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Collects stage timings and metrics and reports them through `log`.
pub struct StdoutPipelineLogger {
    timings: Vec<(String, f64)>,
    metrics: HashMap<String, f64>,
    start_time: Instant,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: Vec::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Formatted report, or `None` when nothing was recorded.
    ///
    /// Stages are listed in the order they ran; metrics keep their latest
    /// value and are sorted by name.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!("Clip summary ({:.1}s total):", elapsed_ms / 1000.0)];

        for (stage, total_ms) in &self.timings {
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!("  {stage:12}: {total_ms:8.1}ms  ({pct:4.1}%)"));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: {}", format_metric(self.metrics[name])));
        }

        Some(lines.join("\n"))
    }

    /// Total time recorded for a stage, summed over repeated reports.
    #[cfg(test)]
    fn timing_for(&self, stage: &str) -> Option<f64> {
        let mut found = None;
        for (name, ms) in &self.timings {
            if name == stage {
                *found.get_or_insert(0.0) += ms;
            }
        }
        found
    }

    #[cfg(test)]
    fn metric_for(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.1}ms");
        match self.timings.iter_mut().find(|(name, _)| name == stage) {
            Some((_, total)) => *total += duration_ms,
            None => self.timings.push((stage.to_string(), duration_ms)),
        }
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_string(), value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

/// Whole numbers print without decimals so counts read naturally.
fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}
