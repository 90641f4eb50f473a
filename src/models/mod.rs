pub mod activity;
pub mod anomaly;
pub mod forecast;

pub use activity::{detect_fall, Acceleration, ActivitySample, FallAssessment};
pub use anomaly::{score, AnomalyResult, BloodPressure, HealthReading, ANOMALY_THRESHOLD};
pub use forecast::{forecast_heart_rate, HeartRateForecast};
