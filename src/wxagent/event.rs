// wxagent - conversational weather service with an operational metrics dashboard
//
// Copyright 2024 the wxagent authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat interaction, recorded by the serving layer after the reply has
/// been produced. `weather_found` and `city_extracted` are derived by the
/// caller, never recomputed from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    #[serde(with = "iso_timestamp")]
    pub timestamp: NaiveDateTime,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub response_time_ms: f64,
    pub city_extracted: String,
    #[serde(with = "py_bool")]
    pub weather_found: bool,
}

impl RequestEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        session_id: impl Into<String>,
        message: impl Into<String>,
        response: impl Into<String>,
        response_time_ms: f64,
        city_extracted: impl Into<String>,
        weather_found: bool,
    ) -> Self {
        RequestEvent {
            timestamp: Utc::now().naive_utc(),
            session_id: session_id.into(),
            message: message.into(),
            response: response.into(),
            response_time_ms,
            city_extracted: city_extracted.into(),
            weather_found,
        }
    }
}

/// A user rating of one reply. The rating is expected to be in `1..=5`;
/// enforcing that is the service boundary's job, not the store's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(with = "iso_timestamp")]
    pub timestamp: NaiveDateTime,
    pub session_id: String,
    pub message: String,
    pub rating: u8,
    pub feedback_text: String,
    pub response_quality: String,
}

impl FeedbackEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        session_id: impl Into<String>,
        message: impl Into<String>,
        rating: u8,
        feedback_text: impl Into<String>,
        response_quality: impl Into<String>,
    ) -> Self {
        FeedbackEvent {
            timestamp: Utc::now().naive_utc(),
            session_id: session_id.into(),
            message: message.into(),
            rating,
            feedback_text: feedback_text.into(),
            response_quality: response_quality.into(),
        }
    }
}

/// A failure observed while serving a request. `request_data` is an
/// arbitrary JSON object describing the request that failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(with = "iso_timestamp")]
    pub timestamp: NaiveDateTime,
    pub session_id: String,
    pub error_type: String,
    pub error_message: String,
    #[serde(with = "json_cell")]
    pub request_data: serde_json::Value,
}

impl ErrorEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        session_id: impl Into<String>,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        request_data: serde_json::Value,
    ) -> Self {
        ErrorEvent {
            timestamp: Utc::now().naive_utc(),
            session_id: session_id.into(),
            error_type: error_type.into(),
            error_message: error_message.into(),
            request_data,
        }
    }
}

/// Naive ISO-8601 timestamps with microsecond precision, the format the
/// original log producer used. Parsing accepts any fractional precision.
pub(crate) mod iso_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    const READ_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, READ_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Booleans as the literal `True`/`False` tokens so new records stay
/// byte-compatible with logs written by the previous collector.
pub(crate) mod py_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *v { "True" } else { "False" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(d)?;
        match raw.as_str() {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected True or False, got {:?}",
                other
            ))),
        }
    }
}

/// A JSON value carried as text inside a single tabular cell.
pub(crate) mod json_cell {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(v: &Value, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Value, D::Error> {
        let raw = String::deserialize(d)?;
        serde_json::from_str(&raw).map_err(serde::de::Error::custom)
    }
}
