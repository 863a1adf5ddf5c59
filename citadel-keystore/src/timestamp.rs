//! File descriptor timestamps round-trip either of two textual forms coming
//! from the server; the core always emits the first form.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const EMIT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const ACCEPTED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S%.f"];

pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.format(EMIT_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(s) = raw else {
        return Ok(None);
    };
    for format in ACCEPTED_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&s, format) {
            return Ok(Some(Utc.from_utc_datetime(&naive)));
        }
    }
    Err(serde::de::Error::custom(format!(
        "unrecognized timestamp format: {s}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super", default)]
        ts: Option<DateTime<Utc>>,
    }

    #[test]
    fn accepts_both_known_forms() {
        let a: Wrapper = serde_json::from_str(r#"{"ts":"2024-01-02T03:04:05.678Z"}"#).unwrap();
        let b: Wrapper = serde_json::from_str(r#"{"ts":"2024-01-02 03:04:05.678"}"#).unwrap();
        assert_eq!(a.ts, b.ts);
    }

    #[test]
    fn always_emits_the_iso_form() {
        let w = Wrapper {
            ts: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
        };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("2024-01-02T03:04:05"));
        assert!(json.ends_with("Z\"}"));
    }
}
