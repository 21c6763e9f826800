use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics for the meal-budget service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Database metrics
    pub database_operations_total: CounterVec,
    pub database_operation_duration_seconds: HistogramVec,
    pub database_connections_active: Gauge,

    // Business metrics
    pub budget_operations_total: CounterVec,
    pub expenditure_operations_total: CounterVec,
    pub cart_checkouts_total: CounterVec,
    pub sms_parse_attempts_total: CounterVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let database_operations_total = CounterVec::new(
            Opts::new(
                "database_operations_total",
                "Total number of database operations",
            ),
            &["operation", "table", "status"],
        )?;

        let database_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "database_operation_duration_seconds",
                "Database operation duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["operation", "table"],
        )?;

        let database_connections_active = Gauge::new(
            "database_connections_active",
            "Number of active database connections",
        )?;

        let budget_operations_total = CounterVec::new(
            Opts::new(
                "budget_operations_total",
                "Total number of budget operations",
            ),
            &["operation", "level", "status"],
        )?;

        let expenditure_operations_total = CounterVec::new(
            Opts::new(
                "expenditure_operations_total",
                "Total number of expenditure operations",
            ),
            &["operation", "status"],
        )?;

        let cart_checkouts_total = CounterVec::new(
            Opts::new("cart_checkouts_total", "Total number of cart checkouts"),
            &["status"],
        )?;

        let sms_parse_attempts_total = CounterVec::new(
            Opts::new(
                "sms_parse_attempts_total",
                "Total number of card SMS parse attempts",
            ),
            &["vendor", "status"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(database_operations_total.clone()))?;
        registry.register(Box::new(database_operation_duration_seconds.clone()))?;
        registry.register(Box::new(database_connections_active.clone()))?;
        registry.register(Box::new(budget_operations_total.clone()))?;
        registry.register(Box::new(expenditure_operations_total.clone()))?;
        registry.register(Box::new(cart_checkouts_total.clone()))?;
        registry.register(Box::new(sms_parse_attempts_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            database_operations_total,
            database_operation_duration_seconds,
            database_connections_active,
            budget_operations_total,
            expenditure_operations_total,
            cart_checkouts_total,
            sms_parse_attempts_total,
        })
    }

    /// Get the metrics registry for exposing the metrics endpoint
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record database operation metrics
    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.database_operations_total
            .with_label_values(&[operation, table, status])
            .inc();

        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    /// Record a budget operation at one of the monthly/daily/meal levels
    pub fn record_budget_operation(&self, operation: &str, level: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.budget_operations_total
            .with_label_values(&[operation, level, status])
            .inc();
    }

    /// Record an expenditure operation
    pub fn record_expenditure_operation(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.expenditure_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    /// Record a cart checkout
    pub fn record_cart_checkout(&self, success: bool) {
        let status = if success { "success" } else { "error" };

        self.cart_checkouts_total.with_label_values(&[status]).inc();
    }

    /// Record a card SMS parse attempt
    pub fn record_sms_parse(&self, vendor: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.sms_parse_attempts_total
            .with_label_values(&[vendor, status])
            .inc();
    }

    /// Increment in-flight requests
    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    /// Decrement in-flight requests
    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }

    /// Set active database connections
    pub fn set_active_connections(&self, count: f64) {
        self.database_connections_active.set(count);
    }
}
