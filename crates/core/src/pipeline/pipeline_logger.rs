use std::collections::HashMap;
use std::time::Instant;

/// Observer for classification run events.
///
/// Use cases report through this trait so the CLI can print progress and
/// a stage summary while tests stay silent.
pub trait PipelineLogger: Send {
    /// Report image-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one image.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a per-image metric (e.g. faces detected).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Report an image that was abandoned while the run continued.
    fn image_failed(&mut self, image_id: &str, reason: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
    fn image_failed(&mut self, _image_id: &str, _reason: &str) {}
}

/// CLI logger: throttled progress through `log`, per-stage timing and
/// metric aggregation, and a summary at the end of the run.
pub struct StdoutPipelineLogger {
    throttle_images: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    images_done: usize,
    total_images: usize,
    failures: Vec<(String, String)>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_images: usize) -> Self {
        Self {
            throttle_images: throttle_images.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            images_done: 0,
            total_images: 0,
            failures: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.images_done == 0 && self.failures.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Classification summary ({}/{} images, {} failed, {:.1}s total):",
            self.images_done,
            self.total_images,
            self.failures.len(),
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:7.1}ms  total {total_ms:8.0}ms"
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        for (image, reason) in &self.failures {
            lines.push(format!("  failed {image}: {reason}"));
        }

        if self.images_done > 0 && elapsed_ms > 0.0 {
            let rate = self.images_done as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.1} images/s"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }

    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.images_done = current;
        self.total_images = total;
        if total > 0 && (current % self.throttle_images == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Classifying: {current}/{total} images ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn image_failed(&mut self, image_id: &str, reason: &str) {
        log::warn!("Skipping {image_id}: {reason}");
        self.failures.push((image_id.to_string(), reason.to_string()));
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.progress(1, 10);
        logger.timing("extract", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.image_failed("a.jpg", "bad");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("extract", 20.0);
        logger.timing("extract", 30.0);
        logger.timing("match", 5.0);

        assert_eq!(logger.timings_for("extract").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("match").unwrap(), &[5.0]);
        assert!(logger.timings_for("place").is_none());
    }

    #[test]
    fn test_metric_average_in_summary() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(2, 2);
        logger.metric("faces", 3.0);
        logger.metric("faces", 4.0);

        assert_relative_eq!(mean(logger.metrics_for("faces").unwrap()), 3.5);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("faces: avg 3.5"));
    }

    #[test]
    fn test_summary_lists_stages_and_failures() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(3, 4);
        logger.timing("extract", 20.0);
        logger.timing("place", 1.0);
        logger.image_failed("broken.jpg", "could not decode image");

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Classification summary (3/4 images, 1 failed"));
        assert!(summary.contains("extract"));
        assert!(summary.contains("place"));
        assert!(summary.contains("failed broken.jpg: could not decode image"));
        assert!(summary.contains("images/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_failures_recorded_in_order() {
        let mut logger = StdoutPipelineLogger::default();
        logger.image_failed("a.jpg", "one");
        logger.image_failed("b.jpg", "two");
        assert_eq!(logger.failures()[0].0, "a.jpg");
        assert_eq!(logger.failures()[1].1, "two");
    }

    #[test]
    fn test_zero_throttle_clamped() {
        assert_eq!(StdoutPipelineLogger::new(0).throttle_images, 1);
        assert_eq!(StdoutPipelineLogger::default().throttle_images, 10);
    }
}
