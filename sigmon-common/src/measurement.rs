//! Signal measurement records as delivered by the monitoring service
//!
//! Field names on the wire follow the service's JSON schema
//! (`daerah`, `kecamatan`, `cn`, `mer`, ...). Records are read-only here:
//! classification is always derived, never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Identifier assigned to a record by the remote service
///
/// The service has used both numeric and string keys, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// Whether the audio/video program was received at the site
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum AudioVideo {
    Present,
    Absent,
    /// Field missing, null, blank or filled with an unrecognised value
    #[default]
    Unknown,
}

impl From<Option<String>> for AudioVideo {
    fn from(value: Option<String>) -> Self {
        value.map_or(AudioVideo::Unknown, AudioVideo::from)
    }
}

impl From<String> for AudioVideo {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tampil" | "present" => AudioVideo::Present,
            "tidak tampil" | "absent" => AudioVideo::Absent,
            _ => AudioVideo::Unknown,
        }
    }
}

impl From<AudioVideo> for String {
    fn from(value: AudioVideo) -> Self {
        match value {
            AudioVideo::Present => "Tampil".to_string(),
            AudioVideo::Absent => "Tidak Tampil".to_string(),
            AudioVideo::Unknown => String::new(),
        }
    }
}

/// One field observation submitted by a surveyor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(rename = "daerah")]
    pub region: String,

    #[serde(rename = "kecamatan")]
    pub subregion: String,

    /// Field strength (dBµV/m)
    #[serde(deserialize_with = "lenient_f64")]
    pub power: f64,

    /// Carrier-to-noise ratio (dB)
    #[serde(rename = "cn", deserialize_with = "lenient_f64")]
    pub carrier_to_noise: f64,

    /// Modulation error ratio (dB)
    #[serde(rename = "mer", deserialize_with = "lenient_f64")]
    pub modulation_error_ratio: f64,

    /// Link margin (dB)
    #[serde(rename = "linkMargin", deserialize_with = "lenient_f64")]
    pub link_margin: f64,

    #[serde(rename = "audioVideo", default)]
    pub audio_video: AudioVideo,

    /// Absent when the surveyor's device had no fix
    #[serde(rename = "lat", default, deserialize_with = "lenient_opt_f64")]
    pub latitude: Option<f64>,

    #[serde(rename = "lon", default, deserialize_with = "lenient_opt_f64")]
    pub longitude: Option<f64>,

    #[serde(rename = "date")]
    pub observed_at: DateTime<Utc>,

    #[serde(rename = "user_name", default, deserialize_with = "null_as_empty")]
    pub owner_user_name: String,
}

impl Measurement {
    /// Display label used in notifications and insights: "region, subregion"
    pub fn location(&self) -> String {
        format!("{}, {}", self.region, self.subregion)
    }

    /// Decode a single JSON value, rejecting records with missing or
    /// non-numeric channels
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::MalformedRecord(e.to_string()))
    }

    /// Decode a single JSON document (one push payload)
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedRecord(e.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// Finite value or a description of why there is none
    fn finite(self) -> std::result::Result<f64, String> {
        let n = match self {
            NumberOrString::Number(n) => n,
            NumberOrString::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number {:?}: {}", s, e))?,
        };
        if n.is_finite() {
            Ok(n)
        } else {
            Err(format!("non-finite number {}", n))
        }
    }
}

/// Accept numbers and numeric strings
///
/// Records created through the web form arrive with channel values as
/// strings ("46.5"); records from field devices carry plain numbers.
/// NaN and infinities are rejected.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?
        .finite()
        .map_err(serde::de::Error::custom)
}

/// Like [`lenient_f64`], but null and blank strings become `None`
fn lenient_opt_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => value.finite().map(Some).map_err(serde::de::Error::custom),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Build a measurement at a fixed location with the given channel values
    pub fn measurement(power: f64, cn: f64, mer: f64, link_margin: f64) -> Measurement {
        Measurement {
            id: None,
            region: "Bandung".to_string(),
            subregion: "Cicendo".to_string(),
            power,
            carrier_to_noise: cn,
            modulation_error_ratio: mer,
            link_margin,
            audio_video: AudioVideo::Present,
            latitude: Some(-6.9),
            longitude: Some(107.6),
            observed_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            owner_user_name: "surveyor".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_wire_record() {
        let value = json!({
            "id": 17,
            "daerah": "Bandung",
            "kecamatan": "Coblong",
            "power": 46.2,
            "cn": 21,
            "mer": 27.5,
            "linkMargin": 4,
            "audioVideo": "Tampil",
            "lat": -6.88,
            "lon": 107.61,
            "date": "2025-03-01T08:15:00Z",
            "user_name": "andi"
        });

        let m = Measurement::from_json_value(value).unwrap();
        assert_eq!(m.id, Some(RecordId::Number(17)));
        assert_eq!(m.region, "Bandung");
        assert_eq!(m.subregion, "Coblong");
        assert_eq!(m.carrier_to_noise, 21.0);
        assert_eq!(m.audio_video, AudioVideo::Present);
        assert_eq!(m.location(), "Bandung, Coblong");
    }

    #[test]
    fn test_decode_string_channels() {
        let value = json!({
            "daerah": "Garut",
            "kecamatan": "Tarogong",
            "power": "44.5",
            "cn": " 20 ",
            "mer": "25",
            "linkMargin": "2.5",
            "audioVideo": "Tidak Tampil",
            "lat": "-7.2",
            "lon": "107.9",
            "date": "2025-03-02T10:00:00Z",
            "user_name": "budi"
        });

        let m = Measurement::from_json_value(value).unwrap();
        assert_eq!(m.power, 44.5);
        assert_eq!(m.carrier_to_noise, 20.0);
        assert_eq!(m.audio_video, AudioVideo::Absent);
        assert_eq!(m.id, None);
    }

    #[test]
    fn test_missing_channel_is_malformed() {
        let value = json!({
            "daerah": "Garut",
            "kecamatan": "Tarogong",
            "power": 50,
            "cn": 22,
            "linkMargin": 7,
            "audioVideo": "Tampil",
            "lat": 0,
            "lon": 0,
            "date": "2025-03-02T10:00:00Z",
            "user_name": "budi"
        });

        let err = Measurement::from_json_value(value).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord(_)));
        assert!(err.to_string().contains("mer"));
    }

    #[test]
    fn test_non_numeric_channel_is_malformed() {
        let json = r#"{"daerah":"A","kecamatan":"B","power":"n/a","cn":22,"mer":29,
            "linkMargin":7,"audioVideo":"","lat":0,"lon":0,
            "date":"2025-03-02T10:00:00Z","user_name":"c"}"#;
        assert!(Measurement::from_json_str(json).is_err());
    }

    #[test]
    fn test_non_finite_channel_is_malformed() {
        for bad in [json!("NaN"), json!("inf"), json!("-Infinity"), json!(" nan ")] {
            let value = json!({
                "daerah": "A", "kecamatan": "B",
                "power": bad, "cn": 22, "mer": 29, "linkMargin": 7,
                "audioVideo": "Tampil", "lat": 0, "lon": 0,
                "date": "2025-03-02T10:00:00Z", "user_name": "c"
            });
            let err = Measurement::from_json_value(value).unwrap_err();
            assert!(matches!(err, Error::MalformedRecord(_)));
            assert!(err.to_string().contains("non-finite"));
        }
    }

    #[test]
    fn test_non_finite_location_is_malformed() {
        let value = json!({
            "daerah": "A", "kecamatan": "B",
            "power": 50, "cn": 22, "mer": 29, "linkMargin": 7,
            "lat": "inf", "date": "2025-03-02T10:00:00Z"
        });
        assert!(Measurement::from_json_value(value).is_err());
    }

    #[test]
    fn test_optional_fields_tolerate_null_and_missing() {
        let value = json!({
            "daerah": "Bandung",
            "kecamatan": "Cicendo",
            "power": 40,
            "cn": 22,
            "mer": 29,
            "linkMargin": 7,
            "audioVideo": null,
            "lat": null,
            "lon": "",
            "date": "2025-03-02T10:00:00Z",
            "user_name": null
        });

        let m = Measurement::from_json_value(value).unwrap();
        assert_eq!(m.audio_video, AudioVideo::Unknown);
        assert_eq!(m.latitude, None);
        assert_eq!(m.longitude, None);
        assert_eq!(m.owner_user_name, "");

        let sparse = json!({
            "daerah": "Bandung", "kecamatan": "Cicendo",
            "power": 40, "cn": 22, "mer": 29, "linkMargin": 7,
            "date": "2025-03-02T10:00:00Z"
        });
        let m = Measurement::from_json_value(sparse).unwrap();
        assert_eq!(m.audio_video, AudioVideo::Unknown);
        assert_eq!(m.latitude, None);
        assert!(m.owner_user_name.is_empty());
    }

    #[test]
    fn test_audio_video_unknown_and_roundtrip() {
        assert_eq!(AudioVideo::from(String::new()), AudioVideo::Unknown);
        assert_eq!(AudioVideo::from("present".to_string()), AudioVideo::Present);
        assert_eq!(String::from(AudioVideo::Absent), "Tidak Tampil");
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::Number(5).to_string(), "5");
        assert_eq!(RecordId::Text("abc".into()).to_string(), "abc");
    }
}
