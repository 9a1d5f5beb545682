//! Request and render metrics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::source::ServiceType;

/// Metrics collector for the map API.
#[derive(Debug)]
pub struct MetricsCollector {
    /// Request counts
    pub tile_requests: AtomicU64,
    pub image_requests: AtomicU64,
    pub wms_requests: AtomicU64,
    pub geojson_requests: AtomicU64,

    /// Render stats
    pub renders_total: AtomicU64,
    pub render_errors: AtomicU64,

    render_times: RwLock<TimingStats>,
    service_times: RwLock<HashMap<ServiceType, TimingStats>>,

    start_time: Instant,
}

#[derive(Debug, Default, Clone, Copy)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }

    fn last_ms(&self) -> f64 {
        self.last_us as f64 / 1000.0
    }

    fn min_ms(&self) -> f64 {
        self.min_us as f64 / 1000.0
    }

    fn max_ms(&self) -> f64 {
        self.max_us as f64 / 1000.0
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            tile_requests: AtomicU64::new(0),
            image_requests: AtomicU64::new(0),
            wms_requests: AtomicU64::new(0),
            geojson_requests: AtomicU64::new(0),
            renders_total: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            render_times: RwLock::new(TimingStats::default()),
            service_times: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record an incoming request for a service type.
    pub fn record_request(&self, service: ServiceType) {
        let counter = match service {
            ServiceType::Tile => &self.tile_requests,
            ServiceType::Image => &self.image_requests,
            ServiceType::Wms => &self.wms_requests,
            ServiceType::Geojson => &self.geojson_requests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        counter!("map_requests_total", "service" => service.as_str()).increment(1);
    }

    /// Record a render operation
    pub async fn record_render(&self, service: ServiceType, duration_us: u64, success: bool) {
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        counter!("map_renders_total", "service" => service.as_str()).increment(1);
        if !success {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
            counter!("map_render_errors_total").increment(1);
            return;
        }

        histogram!("map_render_duration_ms").record(duration_us as f64 / 1000.0);
        self.render_times.write().await.record(duration_us);
        self.service_times
            .write()
            .await
            .entry(service)
            .or_default()
            .record(duration_us);
    }

    /// Get current metrics snapshot
    pub async fn snapshot(&self) -> MetricsSnapshot {
        let render_times = *self.render_times.read().await;
        let service_stats = self
            .service_times
            .read()
            .await
            .iter()
            .map(|(service, stats)| {
                (
                    *service,
                    ServiceStats {
                        count: stats.count,
                        avg_ms: stats.avg_ms(),
                        min_ms: stats.min_ms(),
                        max_ms: stats.max_ms(),
                        last_ms: stats.last_ms(),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            tile_requests: self.tile_requests.load(Ordering::Relaxed),
            image_requests: self.image_requests.load(Ordering::Relaxed),
            wms_requests: self.wms_requests.load(Ordering::Relaxed),
            geojson_requests: self.geojson_requests.load(Ordering::Relaxed),
            renders_total: self.renders_total.load(Ordering::Relaxed),
            render_errors: self.render_errors.load(Ordering::Relaxed),
            render_avg_ms: render_times.avg_ms(),
            render_last_ms: render_times.last_ms(),
            render_min_ms: render_times.min_ms(),
            render_max_ms: render_times.max_ms(),
            service_stats,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics for JSON serialization.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,

    // Request counts
    pub tile_requests: u64,
    pub image_requests: u64,
    pub wms_requests: u64,
    pub geojson_requests: u64,

    // Render stats
    pub renders_total: u64,
    pub render_errors: u64,
    pub render_avg_ms: f64,
    pub render_last_ms: f64,
    pub render_min_ms: f64,
    pub render_max_ms: f64,

    pub service_stats: HashMap<ServiceType, ServiceStats>,
}

/// Per-service-type render timings.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
}

/// Timer guard for measuring operation duration.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
