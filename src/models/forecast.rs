use serde::{Deserialize, Serialize};

use super::anomaly::HealthReading;

const WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateForecast {
    pub prediction: f64,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

/// Predicts the next heart rate from the mean of the last three samples.
///
/// Confidence drops as the window's spread grows; readings without a heart
/// rate count as zero.
pub fn forecast_heart_rate(history: &[HealthReading]) -> HeartRateForecast {
    let recent = &history[history.len().saturating_sub(WINDOW)..];
    if recent.is_empty() {
        return HeartRateForecast {
            prediction: 0.0,
            confidence: 0.0,
            range: None,
        };
    }

    let samples: Vec<f64> = recent.iter().map(|r| r.heart_rate.unwrap_or(0.0)).collect();
    let count = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / count;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count;
    let spread = variance.sqrt();

    HeartRateForecast {
        prediction: round1(mean),
        confidence: (1.0 - spread / 20.0).clamp(0.0, 1.0),
        range: Some((round1(mean - spread), round1(mean + spread))),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(heart_rate: f64) -> HealthReading {
        HealthReading {
            heart_rate: Some(heart_rate),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_history() {
        let forecast = forecast_heart_rate(&[]);
        assert_eq!(forecast.prediction, 0.0);
        assert_eq!(forecast.confidence, 0.0);
        assert!(forecast.range.is_none());
    }

    #[test]
    fn test_uses_last_three_samples() {
        let history = vec![reading(140.0), reading(70.0), reading(72.0), reading(74.0)];
        let forecast = forecast_heart_rate(&history);

        assert_eq!(forecast.prediction, 72.0);
        assert!(forecast.confidence > 0.9);
        let (low, high) = forecast.range.unwrap();
        assert!(low < 72.0 && high > 72.0);
    }

    #[test]
    fn test_wide_spread_lowers_confidence() {
        let history = vec![reading(40.0), reading(120.0), reading(60.0)];
        let forecast = forecast_heart_rate(&history);
        assert_eq!(forecast.confidence, 0.0);
    }
}
