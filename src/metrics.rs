//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("rookery_http_request_duration_seconds", "HTTP request latencies in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        &["method", "route"]
    ).expect("metric can be created");

    // Follow graph
    pub static ref FOLLOW_TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_follow_toggles_total", "Total number of follow toggles"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref NOTIFICATIONS_CREATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_notifications_created_total", "Total number of notifications created"),
        &["notification_type"]
    ).expect("metric can be created");

    // Posts
    pub static ref POST_WRITES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_post_writes_total", "Total number of posts created or deleted"),
        &["action"]
    ).expect("metric can be created");
    pub static ref LIKE_TOGGLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_like_toggles_total", "Total number of like toggles"),
        &["outcome"]
    ).expect("metric can be created");

    // Accounts
    pub static ref SIGNUPS_TOTAL: IntCounter = IntCounter::new(
        "rookery_signups_total",
        "Total number of registered users"
    ).expect("metric can be created");
    pub static ref PROFILE_UPDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_profile_updates_total", "Total number of profile update attempts"),
        &["status"]
    ).expect("metric can be created");

    // Media
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_media_uploads_total", "Total number of media uploads"),
        &["status"]
    ).expect("metric can be created");
    pub static ref MEDIA_DESTROYS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_media_destroys_total", "Total number of media deletions"),
        &["status"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("rookery_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(FOLLOW_TOGGLES_TOTAL.clone()))
        .expect("FOLLOW_TOGGLES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(NOTIFICATIONS_CREATED_TOTAL.clone()))
        .expect("NOTIFICATIONS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(POST_WRITES_TOTAL.clone()))
        .expect("POST_WRITES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(LIKE_TOGGLES_TOTAL.clone()))
        .expect("LIKE_TOGGLES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SIGNUPS_TOTAL.clone()))
        .expect("SIGNUPS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PROFILE_UPDATES_TOTAL.clone()))
        .expect("PROFILE_UPDATES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(MEDIA_UPLOADS_TOTAL.clone()))
        .expect("MEDIA_UPLOADS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(MEDIA_DESTROYS_TOTAL.clone()))
        .expect("MEDIA_DESTROYS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
