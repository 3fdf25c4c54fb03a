//! Signal-quality classification
//!
//! Four channels are judged against fixed bands:
//!
//! | channel | problem if | acceptable band | good if |
//! |---|---|---|---|
//! | power | < 45 | [45, 48] | > 48 |
//! | carrier-to-noise | < 20.5 | [20.5, 21.5] | > 21.5 |
//! | modulation error ratio | < 26 | [26, 28] | > 28 |
//! | link margin | < 3 | [3, 6] | > 6 |
//!
//! Boundary values always belong to the acceptable band. The verdict is
//! decided by the worst channel; the deficient-channel list is per channel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::measurement::Measurement;

/// One of the four numeric signal-quality channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Power,
    CarrierToNoise,
    ModulationErrorRatio,
    LinkMargin,
}

/// Lower edge of the acceptable band and upper edge (good bound)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBounds {
    pub acceptable_lower: f64,
    pub good_bound: f64,
}

impl Channel {
    /// Evaluation and reporting order
    pub const ALL: [Channel; 4] = [
        Channel::Power,
        Channel::CarrierToNoise,
        Channel::ModulationErrorRatio,
        Channel::LinkMargin,
    ];

    pub fn bounds(self) -> ChannelBounds {
        match self {
            Channel::Power => ChannelBounds { acceptable_lower: 45.0, good_bound: 48.0 },
            Channel::CarrierToNoise => ChannelBounds { acceptable_lower: 20.5, good_bound: 21.5 },
            Channel::ModulationErrorRatio => ChannelBounds { acceptable_lower: 26.0, good_bound: 28.0 },
            Channel::LinkMargin => ChannelBounds { acceptable_lower: 3.0, good_bound: 6.0 },
        }
    }

    /// Short label shown to operators
    pub fn label(self) -> &'static str {
        match self {
            Channel::Power => "Power",
            Channel::CarrierToNoise => "C/N",
            Channel::ModulationErrorRatio => "MER",
            Channel::LinkMargin => "Link Margin",
        }
    }

    /// Stable machine name (matches the serde representation)
    pub fn name(self) -> &'static str {
        match self {
            Channel::Power => "power",
            Channel::CarrierToNoise => "carrierToNoise",
            Channel::ModulationErrorRatio => "modulationErrorRatio",
            Channel::LinkMargin => "linkMargin",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Channel::Power => "dBµV/m",
            _ => "dB",
        }
    }

    pub fn value_of(self, measurement: &Measurement) -> f64 {
        match self {
            Channel::Power => measurement.power,
            Channel::CarrierToNoise => measurement.carrier_to_noise,
            Channel::ModulationErrorRatio => measurement.modulation_error_ratio,
            Channel::LinkMargin => measurement.link_margin,
        }
    }

    /// Strictly below the acceptable lower bound
    pub fn is_deficient(self, value: f64) -> bool {
        value < self.bounds().acceptable_lower
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a single channel value within its bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelBand {
    /// Below the acceptable lower bound
    Low,
    /// Within `[acceptable_lower, good_bound]`, inclusive
    Fair,
    /// Strictly above the good bound
    High,
}

impl ChannelBand {
    pub fn of(channel: Channel, value: f64) -> Self {
        let bounds = channel.bounds();
        if value > bounds.good_bound {
            ChannelBand::High
        } else if value >= bounds.acceptable_lower {
            ChannelBand::Fair
        } else {
            ChannelBand::Low
        }
    }
}

/// Verdict tier without the deficiency details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    Good,
    Acceptable,
    Problem,
}

impl QualityTier {
    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Good => "Good signal",
            QualityTier::Acceptable => "Acceptable signal",
            QualityTier::Problem => "Problem signal",
        }
    }
}

/// Classification result for one measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict")]
pub enum QualityVerdict {
    Good,
    Acceptable,
    /// At least one channel is below its acceptable band
    Problem {
        /// Failing channels, in [`Channel::ALL`] order
        deficient: Vec<Channel>,
    },
}

impl QualityVerdict {
    pub fn tier(&self) -> QualityTier {
        match self {
            QualityVerdict::Good => QualityTier::Good,
            QualityVerdict::Acceptable => QualityTier::Acceptable,
            QualityVerdict::Problem { .. } => QualityTier::Problem,
        }
    }

    pub fn label(&self) -> &'static str {
        self.tier().label()
    }

    pub fn is_problem(&self) -> bool {
        matches!(self, QualityVerdict::Problem { .. })
    }

    /// Empty unless the verdict is `Problem`
    pub fn deficient_channels(&self) -> &[Channel] {
        match self {
            QualityVerdict::Problem { deficient } => deficient,
            _ => &[],
        }
    }
}

/// Classify a measurement
///
/// Total and deterministic: the same record always yields the same verdict.
pub fn classify(measurement: &Measurement) -> QualityVerdict {
    let deficient: Vec<Channel> = Channel::ALL
        .into_iter()
        .filter(|c| c.is_deficient(c.value_of(measurement)))
        .collect();

    if !deficient.is_empty() {
        return QualityVerdict::Problem { deficient };
    }

    let all_high = Channel::ALL
        .into_iter()
        .all(|c| ChannelBand::of(c, c.value_of(measurement)) == ChannelBand::High);

    if all_high {
        QualityVerdict::Good
    } else {
        QualityVerdict::Acceptable
    }
}

/// Per-channel explanation shown next to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAdvice {
    pub channel: Channel,
    pub band: ChannelBand,
    pub text: String,
}

fn remediation(channel: Channel) -> &'static [&'static str] {
    match channel {
        Channel::Power => &["Check the antenna or the signal distribution system."],
        Channel::CarrierToNoise => &["Avoid sources of interference.", "Correct the antenna alignment."],
        Channel::ModulationErrorRatio => &["Check connections and transmitter equipment."],
        Channel::LinkMargin => &["Check signal strength and antenna position."],
    }
}

/// Describe each channel's band, with remediation steps for low channels
pub fn channel_advice(measurement: &Measurement) -> Vec<ChannelAdvice> {
    Channel::ALL
        .into_iter()
        .map(|channel| {
            let bounds = channel.bounds();
            let unit = channel.unit();
            let band = ChannelBand::of(channel, channel.value_of(measurement));
            let text = match band {
                ChannelBand::High => {
                    format!("{} good (>{} {}).", channel.label(), bounds.good_bound, unit)
                }
                ChannelBand::Fair => format!(
                    "{} fair ({}–{} {}). Adequate.",
                    channel.label(),
                    bounds.acceptable_lower,
                    bounds.good_bound,
                    unit
                ),
                ChannelBand::Low => {
                    let mut text = format!(
                        "{} low (<{} {}).\nRecommendation:",
                        channel.label(),
                        bounds.acceptable_lower,
                        unit
                    );
                    for step in remediation(channel) {
                        text.push_str("\n- ");
                        text.push_str(step);
                    }
                    text
                }
            };
            ChannelAdvice { channel, band, text }
        })
        .collect()
}

/// All advice paragraphs joined by blank lines
pub fn summary_text(measurement: &Measurement) -> String {
    channel_advice(measurement)
        .into_iter()
        .map(|a| a.text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
