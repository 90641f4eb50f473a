use serde::{Deserialize, Serialize};

const FALL_ACCELERATION_Z: f64 = -15.0;
const FALL_CONFIDENCE: f64 = 0.9;
const NO_FALL_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<Acceleration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallAssessment {
    pub fall_detected: bool,
    pub confidence: f64,
}

/// A sharp downward acceleration is read as a fall.
pub fn detect_fall(sample: &ActivitySample) -> FallAssessment {
    let fall_detected = sample
        .acceleration
        .is_some_and(|a| a.z < FALL_ACCELERATION_Z);

    FallAssessment {
        fall_detected,
        confidence: if fall_detected {
            FALL_CONFIDENCE
        } else {
            NO_FALL_CONFIDENCE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharp_drop_is_a_fall() {
        let sample = ActivitySample {
            acceleration: Some(Acceleration {
                x: 0.3,
                y: 1.2,
                z: -18.5,
            }),
            location: Some("bathroom".to_string()),
        };

        let assessment = detect_fall(&sample);
        assert!(assessment.fall_detected);
        assert_eq!(assessment.confidence, 0.9);
    }

    #[test]
    fn test_missing_acceleration_is_not_a_fall() {
        let assessment = detect_fall(&ActivitySample::default());
        assert!(!assessment.fall_detected);
    }
}
