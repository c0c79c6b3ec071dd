//! Total mappings from host-supplied values to source settings.

use super::{AccuracyTier, ActivityHint};
use crate::common::constants::*;

/// Map a requested accuracy distance in meters to an accuracy tier.
///
/// First match wins:
///
/// | requested   | tier                |
/// |-------------|---------------------|
/// | 0           | best for navigation |
/// | below 0     | best                |
/// | 1-9         | best                |
/// | 10-99       | nearest ten meters  |
/// | 100-999     | hundred meters      |
/// | 1000-2999   | kilometer           |
/// | 3000 and up | three kilometers    |
pub fn resolve_accuracy_tier(requested_distance_meters: i64) -> AccuracyTier {
    match requested_distance_meters {
        0 => AccuracyTier::BestForNavigation,
        d if d < BEST_ACCURACY_LIMIT => AccuracyTier::Best,
        d if d < TEN_METER_ACCURACY_LIMIT => AccuracyTier::NearestTenMeters,
        d if d < HUNDRED_METER_ACCURACY_LIMIT => AccuracyTier::HundredMeters,
        d if d < KILOMETER_ACCURACY_LIMIT => AccuracyTier::Kilometer,
        _ => AccuracyTier::ThreeKilometers,
    }
}

/// Map an activity label to a hint. Only exact matches are recognized.
pub fn resolve_activity_hint(label: &str) -> ActivityHint {
    match label {
        ACTIVITY_AUTOMOTIVE_NAVIGATION => ActivityHint::Automotive,
        ACTIVITY_OTHER_NAVIGATION => ActivityHint::OtherNavigation,
        ACTIVITY_FITNESS => ActivityHint::Fitness,
        _ => ActivityHint::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_tier_boundaries() {
        let cases = [
            (0, AccuracyTier::BestForNavigation),
            (1, AccuracyTier::Best),
            (9, AccuracyTier::Best),
            (10, AccuracyTier::NearestTenMeters),
            (99, AccuracyTier::NearestTenMeters),
            (100, AccuracyTier::HundredMeters),
            (999, AccuracyTier::HundredMeters),
            (1000, AccuracyTier::Kilometer),
            (2999, AccuracyTier::Kilometer),
            (3000, AccuracyTier::ThreeKilometers),
            (i64::MAX, AccuracyTier::ThreeKilometers),
            (-1, AccuracyTier::Best),
            (i64::MIN, AccuracyTier::Best),
        ];

        for (distance, expected) in cases {
            assert_eq!(
                resolve_accuracy_tier(distance),
                expected,
                "wrong tier for {distance} m"
            );
        }
    }

    #[test]
    fn test_activity_hint_exact_labels() {
        assert_eq!(
            resolve_activity_hint("AutomotiveNavigation"),
            ActivityHint::Automotive
        );
        assert_eq!(
            resolve_activity_hint("OtherNavigation"),
            ActivityHint::OtherNavigation
        );
        assert_eq!(resolve_activity_hint("Fitness"), ActivityHint::Fitness);
    }

    #[test]
    fn test_activity_hint_is_case_sensitive() {
        assert_eq!(resolve_activity_hint("fitness"), ActivityHint::Other);
        assert_eq!(resolve_activity_hint(" Fitness"), ActivityHint::Other);
        assert_eq!(resolve_activity_hint(""), ActivityHint::Other);
        assert_eq!(resolve_activity_hint("Other"), ActivityHint::Other);
    }
}
