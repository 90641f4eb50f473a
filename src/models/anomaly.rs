use serde::{Deserialize, Serialize};

pub const ANOMALY_THRESHOLD: f64 = 0.7;

const HEART_RATE_WEIGHT: f64 = 0.4;
const BLOOD_PRESSURE_WEIGHT: f64 = 0.4;
const TEMPERATURE_WEIGHT: f64 = 0.4;
const INACTIVITY_WEIGHT: f64 = 0.3;

const HEART_RATE_RANGE: (f64, f64) = (50.0, 100.0);
const MAX_SYSTOLIC: f64 = 140.0;
const MAX_DIASTOLIC: f64 = 90.0;
const TEMPERATURE_RANGE: (f64, f64) = (36.0, 38.0);
const MAX_INACTIVE_MINUTES: f64 = 180.0;

/// A single health/activity reading. Absent signals do not contribute to the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<BloodPressure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<f64>,
    /// Minutes since the last recorded activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_inactive: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub threshold: f64,
    pub details: String,
}

/// Scores a reading by summing fixed per-signal weights.
///
/// The score is not normalized and can exceed 1.0 when several signals are out
/// of range at once.
pub fn score(reading: &HealthReading) -> AnomalyResult {
    let mut anomaly_score = 0.0;

    if let Some(heart_rate) = reading.heart_rate {
        if heart_rate < HEART_RATE_RANGE.0 || heart_rate > HEART_RATE_RANGE.1 {
            anomaly_score += HEART_RATE_WEIGHT;
        }
    }

    if let Some(pressure) = &reading.blood_pressure {
        let systolic_high = pressure.systolic.is_some_and(|s| s > MAX_SYSTOLIC);
        let diastolic_high = pressure.diastolic.is_some_and(|d| d > MAX_DIASTOLIC);
        if systolic_high || diastolic_high {
            anomaly_score += BLOOD_PRESSURE_WEIGHT;
        }
    }

    if let Some(temperature) = reading.temperature {
        if temperature < TEMPERATURE_RANGE.0 || temperature > TEMPERATURE_RANGE.1 {
            anomaly_score += TEMPERATURE_WEIGHT;
        }
    }

    if reading.activity_level == Some(0.0)
        && reading
            .time_inactive
            .is_some_and(|minutes| minutes > MAX_INACTIVE_MINUTES)
    {
        anomaly_score += INACTIVITY_WEIGHT;
    }

    let is_anomaly = anomaly_score >= ANOMALY_THRESHOLD;
    let details = if is_anomaly {
        "Potential health anomaly detected. Please review the data."
    } else {
        "No significant anomalies detected in the health data."
    };

    AnomalyResult {
        is_anomaly,
        anomaly_score,
        threshold: ANOMALY_THRESHOLD,
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normal_reading() {
        let reading = HealthReading {
            heart_rate: Some(72.0),
            blood_pressure: Some(BloodPressure {
                systolic: Some(120.0),
                diastolic: Some(80.0),
            }),
            temperature: Some(36.7),
            ..Default::default()
        };

        let result = score(&reading);
        assert!(!result.is_anomaly);
        assert_eq!(result.anomaly_score, 0.0);
        assert_eq!(result.threshold, 0.7);
    }

    #[test]
    fn test_heart_rate_alone_is_below_threshold() {
        let reading = HealthReading {
            heart_rate: Some(110.0),
            ..Default::default()
        };

        let result = score(&reading);
        assert!(approx(result.anomaly_score, 0.4));
        assert!(!result.is_anomaly);
    }

    #[test]
    fn test_heart_rate_and_systolic_is_anomaly() {
        let reading = HealthReading {
            heart_rate: Some(110.0),
            blood_pressure: Some(BloodPressure {
                systolic: Some(150.0),
                diastolic: None,
            }),
            ..Default::default()
        };

        let result = score(&reading);
        assert!(approx(result.anomaly_score, 0.8));
        assert!(result.is_anomaly);
        assert!(result.details.contains("anomaly detected"));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let reading = HealthReading {
            heart_rate: Some(50.0),
            temperature: Some(38.0),
            blood_pressure: Some(BloodPressure {
                systolic: Some(140.0),
                diastolic: Some(90.0),
            }),
            ..Default::default()
        };

        assert_eq!(score(&reading).anomaly_score, 0.0);
    }

    #[test]
    fn test_inactivity_requires_zero_activity() {
        let idle = HealthReading {
            activity_level: Some(0.0),
            time_inactive: Some(200.0),
            ..Default::default()
        };
        assert!(approx(score(&idle).anomaly_score, 0.3));

        let moving = HealthReading {
            activity_level: Some(2.0),
            time_inactive: Some(200.0),
            ..Default::default()
        };
        assert_eq!(score(&moving).anomaly_score, 0.0);
    }

    #[test]
    fn test_score_is_not_normalized() {
        let reading = HealthReading {
            heart_rate: Some(40.0),
            blood_pressure: Some(BloodPressure {
                systolic: Some(160.0),
                diastolic: Some(100.0),
            }),
            temperature: Some(39.2),
            activity_level: Some(0.0),
            time_inactive: Some(240.0),
        };

        let result = score(&reading);
        assert!(approx(result.anomaly_score, 1.5));
        assert!(result.is_anomaly);
    }

    #[test]
    fn test_reading_from_camel_case_payload() {
        let reading: HealthReading = serde_json::from_value(json!({
            "heartRate": 110,
            "bloodPressure": {"systolic": 150, "diastolic": 85},
            "timeInactive": 12
        }))
        .unwrap();

        assert_eq!(reading.heart_rate, Some(110.0));
        assert_eq!(reading.time_inactive, Some(12.0));
        assert!(score(&reading).is_anomaly);
    }
}
