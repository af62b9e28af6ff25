//! Logging and lightweight metrics for Macrolog
//!
//! - Structured logging with tracing (compact text or JSON lines)
//! - Optional daily-rolling log file
//! - In-process counters and duration histograms

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};
use uuid::Uuid;

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Identifier of this process run, attached to the first log line
static RUN_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Keeps background log writers alive; drop it on shutdown to flush
#[must_use = "dropping the guard stops the file writer"]
pub struct TelemetryGuard {
    _file: Option<WorkerGuard>,
}

/// Initialize the telemetry system with defaults
pub fn init() -> anyhow::Result<TelemetryGuard> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target);
    layers.push(if config.json {
        console.json().boxed()
    } else {
        console.compact().boxed()
    });

    let mut file_guard = None;
    if let Some(dir) = &config.log_directory {
        let appender = tracing_appender::rolling::daily(dir, "macrolog.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        file_guard = Some(guard);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .boxed(),
        );
    }

    let subscriber = tracing_subscriber::registry().with(filter).with(layers);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::debug!(
        run_id = %run_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _file: file_guard })
}

/// Get the current run ID
pub fn run_id() -> &'static str {
    &RUN_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
    pub show_target: bool,
    pub log_directory: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
            log_directory: None,
        }
    }
}

/// Metrics registry for counters and duration histograms
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Increment a counter by a specific amount
    pub fn increment_by(&self, name: &str, value: u64) {
        if let Ok(counters) = self.counters.read() {
            if let Some(counter) = counters.get(name) {
                counter.fetch_add(value, Ordering::Relaxed);
                return;
            }
        }
        if let Ok(mut counters) = self.counters.write() {
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of a counter
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .ok()
            .and_then(|c| c.get(name).map(|v| v.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    /// Record a histogram value
    pub fn histogram(&self, name: &str, value: f64) {
        if let Ok(mut histograms) = self.histograms.write() {
            histograms.entry(name.to_string()).or_default().push(value);
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let counter_values: HashMap<String, u64> = self
            .counters
            .read()
            .map(|c| {
                c.iter()
                    .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
                    .collect()
            })
            .unwrap_or_default();

        let histogram_stats: HashMap<String, HistogramStats> = self
            .histograms
            .read()
            .map(|h| {
                h.iter()
                    .map(|(k, v)| (k.clone(), HistogramStats::from_values(v)))
                    .collect()
            })
            .unwrap_or_default();

        serde_json::json!({
            "run_id": run_id(),
            "uptime_secs": self.uptime_secs(),
            "counters": counter_values,
            "histograms": histogram_stats,
        })
    }
}

/// Histogram statistics
#[derive(Debug, Serialize)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

impl HistogramStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Timer for measuring operation duration in milliseconds
pub struct Timer {
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        let duration = self.record();
        tracing::debug!(
            metric = %self.name,
            duration_ms = duration.as_millis(),
            "Timer completed"
        );
        duration
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            metrics().histogram(&self.name, duration.as_secs_f64() * 1000.0);
            self.recorded = true;
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counter() {
        let registry = MetricsRegistry::new();
        registry.increment("test_counter");
        registry.increment("test_counter");
        registry.increment_by("test_counter", 3);

        assert_eq!(registry.counter("test_counter"), 5);
        assert_eq!(registry.counter("missing"), 0);
    }

    #[test]
    fn test_histogram_stats() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let stats = HistogramStats::from_values(&values);

        assert_eq!(stats.count, 10);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert_eq!(stats.mean, 5.5);
    }

    #[test]
    fn test_timer_records_once() {
        let timer = Timer::start("test_timer_records_once");
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);

        let export = metrics().export_json();
        assert_eq!(export["histograms"]["test_timer_records_once"]["count"], 1);
    }

    #[test]
    fn test_run_id() {
        let id = run_id();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
