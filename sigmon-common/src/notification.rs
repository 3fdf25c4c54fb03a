//! Operator notifications raised for problem measurements

use serde::{Deserialize, Serialize};

use crate::classify::{Channel, QualityVerdict};
use crate::measurement::Measurement;

/// Fixed note attached to every signal notification
pub const BELOW_STANDARD_NOTE: &str = "Signal below standard";

/// A problem measurement as shown in the notification dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// "region, subregion"
    pub location: String,
    /// One entry per deficient channel, e.g. "Power (40)"
    pub deficient_channels: Vec<String>,
    pub note: String,
}

impl Notification {
    /// Build a notification if the verdict is `Problem`
    pub fn for_verdict(measurement: &Measurement, verdict: &QualityVerdict) -> Option<Self> {
        if !verdict.is_problem() {
            return None;
        }

        Some(Self {
            location: measurement.location(),
            deficient_channels: verdict
                .deficient_channels()
                .iter()
                .map(|&c| describe(c, measurement))
                .collect(),
            note: BELOW_STANDARD_NOTE.to_string(),
        })
    }
}

fn describe(channel: Channel, measurement: &Measurement) -> String {
    format!("{} ({})", channel.label(), channel.value_of(measurement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::measurement::test_support::measurement;

    #[test]
    fn test_problem_produces_notification() {
        let m = measurement(40.0, 18.5, 29.0, 2.0);
        let n = Notification::for_verdict(&m, &classify(&m)).expect("problem expected");

        assert_eq!(n.location, "Bandung, Cicendo");
        assert_eq!(n.deficient_channels, vec!["Power (40)", "C/N (18.5)", "Link Margin (2)"]);
        assert_eq!(n.note, BELOW_STANDARD_NOTE);
    }

    #[test]
    fn test_non_problem_produces_nothing() {
        let m = measurement(46.0, 21.0, 27.0, 4.0);
        assert!(Notification::for_verdict(&m, &classify(&m)).is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let m = measurement(40.0, 22.0, 29.0, 7.0);
        let n = Notification::for_verdict(&m, &classify(&m)).unwrap();
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["deficientChannels"][0], "Power (40)");
        assert_eq!(json["location"], "Bandung, Cicendo");
    }
}
