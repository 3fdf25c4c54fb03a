//! Derived views over a batch of measurements
//!
//! - [`generate_insights`]: per-region summary of weak sites among the most
//!   recent measurements, with a field checklist
//! - [`BandDistribution`]: per-channel band counts for charting

use serde::Serialize;

use crate::classify::{Channel, ChannelBand};
use crate::measurement::Measurement;

/// Number of most recent measurements considered by default
pub const DEFAULT_INSIGHT_WINDOW: usize = 5;

const FIELD_CHECKLIST: [&str; 6] = [
    "Check the antenna position so it is not obstructed.",
    "Re-aim the antenna for optimal reception.",
    "Use a booster if the signal is still weak.",
    "Check cable condition and make sure connectors are not loose.",
    "Keep cables away from electrical equipment.",
    "Check the receiver for electronic interference.",
];

/// Weak-site summary for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionInsight {
    pub region: String,
    /// Subregion → weak-channel labels, in first-seen order
    pub issues: Vec<(String, Vec<String>)>,
    pub message: String,
}

fn weak_label(channel: Channel) -> &'static str {
    match channel {
        Channel::Power => "Low power",
        Channel::ModulationErrorRatio => "Low MER",
        Channel::CarrierToNoise => "Low C/N ratio",
        Channel::LinkMargin => "Low link margin",
    }
}

/// Label order used in insight messages
const INSIGHT_ORDER: [Channel; 4] = [
    Channel::Power,
    Channel::ModulationErrorRatio,
    Channel::CarrierToNoise,
    Channel::LinkMargin,
];

/// Summarise weak sites among the `window` most recent measurements
///
/// A channel counts as weak when it is at or below its acceptable lower
/// bound, so sites sitting exactly on the edge are flagged here even though
/// [`crate::classify::classify`] does not report them.
pub fn generate_insights(measurements: &[Measurement], window: usize) -> Vec<RegionInsight> {
    let mut latest: Vec<&Measurement> = measurements.iter().collect();
    latest.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));
    latest.truncate(window);

    // region -> subregion -> labels, all in first-seen order
    let mut regions: Vec<(String, Vec<(String, Vec<String>)>)> = Vec::new();

    for m in latest {
        let labels: Vec<&str> = INSIGHT_ORDER
            .into_iter()
            .filter(|c| c.value_of(m) <= c.bounds().acceptable_lower)
            .map(weak_label)
            .collect();

        let region_idx = match regions.iter().position(|(r, _)| *r == m.region) {
            Some(idx) => idx,
            None => {
                regions.push((m.region.clone(), Vec::new()));
                regions.len() - 1
            }
        };

        if labels.is_empty() {
            continue;
        }

        let subregions = &mut regions[region_idx].1;
        let sub_idx = match subregions.iter().position(|(s, _)| *s == m.subregion) {
            Some(idx) => idx,
            None => {
                subregions.push((m.subregion.clone(), Vec::new()));
                subregions.len() - 1
            }
        };

        let issues = &mut subregions[sub_idx].1;
        for label in labels {
            if !issues.iter().any(|l| l == label) {
                issues.push(label.to_string());
            }
        }
    }

    regions
        .into_iter()
        .filter(|(_, subregions)| !subregions.is_empty())
        .map(|(region, issues)| {
            let message = render_message(&region, &issues);
            RegionInsight { region, issues, message }
        })
        .collect()
}

fn render_message(region: &str, issues: &[(String, Vec<String>)]) -> String {
    let mut message = format!("Signal problems in region {}:\n\n", region);
    for (subregion, labels) in issues {
        message.push_str(&format!("• {}: {}.\n", subregion, labels.join(", ")));
    }
    message.push_str("\nSuggested follow-up for field workers:\n");
    for (i, step) in FIELD_CHECKLIST.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, step));
    }
    message
}

/// Count of measurements per band for one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub high: usize,
    pub fair: usize,
    pub low: usize,
}

impl BandCounts {
    pub fn total(&self) -> usize {
        self.high + self.fair + self.low
    }
}

/// Band counts for every channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandDistribution {
    pub power: BandCounts,
    pub carrier_to_noise: BandCounts,
    pub modulation_error_ratio: BandCounts,
    pub link_margin: BandCounts,
}

impl BandDistribution {
    pub fn from_measurements(measurements: &[Measurement]) -> Self {
        let mut dist = Self::default();
        for m in measurements {
            for channel in Channel::ALL {
                let counts = dist.channel_mut(channel);
                match ChannelBand::of(channel, channel.value_of(m)) {
                    ChannelBand::High => counts.high += 1,
                    ChannelBand::Fair => counts.fair += 1,
                    ChannelBand::Low => counts.low += 1,
                }
            }
        }
        dist
    }

    pub fn channel(&self, channel: Channel) -> BandCounts {
        match channel {
            Channel::Power => self.power,
            Channel::CarrierToNoise => self.carrier_to_noise,
            Channel::ModulationErrorRatio => self.modulation_error_ratio,
            Channel::LinkMargin => self.link_margin,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut BandCounts {
        match channel {
            Channel::Power => &mut self.power,
            Channel::CarrierToNoise => &mut self.carrier_to_noise,
            Channel::ModulationErrorRatio => &mut self.modulation_error_ratio,
            Channel::LinkMargin => &mut self.link_margin,
        }
    }
}
