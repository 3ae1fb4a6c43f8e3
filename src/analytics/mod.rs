//! Analytics module for trend anomaly detection

pub mod anomaly;

pub use anomaly::{
    detect, AnomalyDetector, AnomalySummary, DetectError, DetectResult, DEFAULT_THRESHOLD,
};
