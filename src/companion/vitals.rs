//! Mock biometric readings for the companion dashboard.
//!
//! Nothing here reads a sensor; every call produces a fresh, plausible
//! reading inside fixed resting ranges.

use crate::companion::now_timestamp;
use crate::companion::random::{int_in, RandomSource};
use serde::Serialize;

/// Heart rate is drawn from `[68, 80)` bpm.
const HEART_RATE_BASE: u32 = 68;
const HEART_RATE_SPAN: u32 = 12;

/// Blood oxygen is drawn from `[96, 99)` percent.
const BLOOD_OXYGEN_BASE: u32 = 96;
const BLOOD_OXYGEN_SPAN: u32 = 3;

const BODY_TEMP_BASE: f64 = 36.4;
const BODY_TEMP_SPAN: f64 = 0.8;

const SLEEP_HOURS_BASE: f64 = 6.5;
const SLEEP_HOURS_SPAN: f64 = 2.0;

/// One reading. Decimal values are strings with one fractional digit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub heart_rate: u32,
    pub blood_oxygen: u32,
    pub body_temp: String,
    pub sleep_hours: String,
    pub timestamp: String,
}

pub fn sample(random: &dyn RandomSource) -> HealthMetrics {
    HealthMetrics {
        heart_rate: int_in(random, HEART_RATE_BASE, HEART_RATE_SPAN),
        blood_oxygen: int_in(random, BLOOD_OXYGEN_BASE, BLOOD_OXYGEN_SPAN),
        body_temp: format!("{:.1}", BODY_TEMP_BASE + random.next_unit() * BODY_TEMP_SPAN),
        sleep_hours: format!("{:.1}", SLEEP_HOURS_BASE + random.next_unit() * SLEEP_HOURS_SPAN),
        timestamp: now_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::random::{FixedRandom, ThreadRandom};

    #[test]
    fn test_lower_bounds() {
        let reading = sample(&FixedRandom(0.0));
        assert_eq!(reading.heart_rate, 68);
        assert_eq!(reading.blood_oxygen, 96);
        assert_eq!(reading.body_temp, "36.4");
        assert_eq!(reading.sleep_hours, "6.5");
    }

    #[test]
    fn test_upper_bounds() {
        let reading = sample(&FixedRandom(0.999_999));
        assert_eq!(reading.heart_rate, 79);
        assert_eq!(reading.blood_oxygen, 98);
        assert_eq!(reading.body_temp, "37.2");
        assert_eq!(reading.sleep_hours, "8.5");
    }

    #[test]
    fn test_random_readings_in_range() {
        for _ in 0..200 {
            let reading = sample(&ThreadRandom);
            assert!((68..=79).contains(&reading.heart_rate));
            assert!((96..=98).contains(&reading.blood_oxygen));
            let temp: f64 = reading.body_temp.parse().unwrap();
            assert!((36.4..=37.2).contains(&temp));
            let sleep: f64 = reading.sleep_hours.parse().unwrap();
            assert!((6.5..=8.5).contains(&sleep));
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(sample(&FixedRandom(0.5))).unwrap();
        assert!(value.get("heartRate").is_some());
        assert!(value.get("bloodOxygen").is_some());
        assert!(value.get("bodyTemp").unwrap().is_string());
        assert!(value.get("sleepHours").unwrap().is_string());
    }
}
