use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting logger for batch job events.
///
/// Use cases report through this trait so callers decide whether progress
/// ends up in the `log` facade, a UI, or nowhere.
pub trait PipelineLogger: Send {
    /// Report item-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one item.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Add to a named counter (faces found, images skipped, ...).
    fn count(&mut self, name: &str, amount: usize);

    /// Emit an end-of-job summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for tests and embedding callers.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn count(&mut self, _name: &str, _amount: usize) {}
}

/// Routes job events to the `log` crate.
///
/// Progress lines are throttled to every `throttle` items; timings and
/// counters are aggregated into a summary at the end of the job.
pub struct LogPipelineLogger {
    job: String,
    throttle: usize,
    timings: BTreeMap<String, Vec<f64>>,
    counters: BTreeMap<String, usize>,
    start_time: Instant,
    total_items: usize,
}

impl LogPipelineLogger {
    pub fn new(job: &str, throttle: usize) -> Self {
        Self {
            job: job.to_string(),
            throttle: throttle.max(1),
            timings: BTreeMap::new(),
            counters: BTreeMap::new(),
            start_time: Instant::now(),
            total_items: 0,
        }
    }

    pub fn counter(&self, name: &str) -> usize {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.counters.is_empty() {
            return None;
        }

        let elapsed_s = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "{} summary ({} items, {elapsed_s:.1}s):",
            self.job, self.total_items
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }
        for (name, value) in &self.counters {
            lines.push(format!("  {name}: {value}"));
        }

        Some(lines.join("\n"))
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_items = total;
        if total > 0 && (current % self.throttle == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("{}: {current}/{total} ({pct:.1}%)", self.job);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn count(&mut self, name: &str, amount: usize) {
        *self.counters.entry(name.to_string()).or_default() += amount;
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
