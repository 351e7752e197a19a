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

//! Rule-based chat agent. Routing is a handful of string-matching rules;
//! the interesting work happens in the weather client it delegates to.

use crate::client::{ClientError, WeatherClient};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

pub const EMPTY_MESSAGE_HINT: &str = "Enter a request, for example: Weather in Berlin";
pub const FORMAT_HINT: &str = "Format: 'Weather in Berlin' or just 'Berlin'.";
pub const EMPTY_CITY_HINT: &str = "Please specify a city, for example: Berlin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
}

#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub speaker: Speaker,
    pub text: String,
}

/// Weather chat agent with in-memory per-session history.
#[derive(Debug)]
pub struct WeatherAgent {
    client: WeatherClient,
    history: Mutex<HashMap<String, Vec<ChatTurn>>>,
}

impl WeatherAgent {
    pub fn new(client: WeatherClient) -> Self {
        WeatherAgent {
            client,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Answer one message. Lookup failures (network, unexpected status)
    /// propagate; a city the geocoder does not know is a normal reply,
    /// not an error.
    pub async fn ask(&self, session_id: &str, message: &str) -> Result<String, ClientError> {
        self.record(session_id, Speaker::User, message);

        if message.trim().is_empty() {
            self.record(session_id, Speaker::Agent, EMPTY_MESSAGE_HINT);
            return Ok(EMPTY_MESSAGE_HINT.to_owned());
        }

        let city = extract_city(message);
        let reply = if city.is_empty() {
            FORMAT_HINT.to_owned()
        } else {
            self.lookup(&city).await?
        };

        self.record(session_id, Speaker::Agent, &reply);
        Ok(reply)
    }

    /// Turns recorded for one session, oldest first.
    pub fn session_history(&self, session_id: &str) -> Vec<ChatTurn> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.get(session_id).cloned().unwrap_or_default()
    }

    async fn lookup(&self, city: &str) -> Result<String, ClientError> {
        if city.is_empty() {
            return Ok(EMPTY_CITY_HINT.to_owned());
        }
        match self.client.geocode(city).await? {
            None => Ok(format!("City not found: {}", city)),
            Some(location) => {
                let current = self
                    .client
                    .current_weather(location.latitude, location.longitude)
                    .await?;
                Ok(format!(
                    "{}, {}: currently {}°C, wind {} km/h, weather code {}.",
                    location.name,
                    location.country,
                    current.temperature,
                    current.windspeed,
                    current.weathercode,
                ))
            }
        }
    }

    fn record(&self, session_id: &str, speaker: Speaker, text: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history
            .entry(session_id.to_owned())
            .or_default()
            .push(ChatTurn {
                speaker,
                text: text.to_owned(),
            });
    }
}

/// Pull a city name out of a chat message.
///
/// A message mentioning weather ("weather" or "погод") names its city as
/// the token after "in"/"в"; without that token there is no city. A bare
/// single-word message is itself the city. Anything else has no city.
pub fn extract_city(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lower = trimmed.to_lowercase();
    if lower.contains("погод") || lower.contains("weather") {
        let cleaned = trimmed.replace(&['?', '.'][..], " ");
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            let wl = word.to_lowercase();
            if (wl == "in" || wl == "в") && i + 1 < words.len() {
                return words[i + 1].trim().to_owned();
            }
        }
        // no "in <city>" marker, do not guess from the last word
        return String::new();
    }

    if trimmed.split_whitespace().count() == 1 {
        return trimmed.to_owned();
    }
    String::new()
}
