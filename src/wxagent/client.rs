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

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    Unexpected(StatusCode, String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Client for the Open-Meteo geocoding and forecast APIs. A weather lookup
/// is two calls: resolve the city name to coordinates, then fetch the
/// current conditions at those coordinates.
#[derive(Debug)]
pub struct WeatherClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(client: Client, geocoding_url: &str, forecast_url: &str) -> Self {
        WeatherClient {
            client,
            geocoding_url: geocoding_url.to_owned(),
            forecast_url: forecast_url.to_owned(),
        }
    }

    /// Resolve a city name to its best-matching location, `None` when the
    /// geocoder knows no such city.
    pub async fn geocode(&self, city: &str) -> Result<Option<Location>, ClientError> {
        tracing::debug!(message = "making geocoding request", city = %city);
        let res = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", city),
                ("count", "1"),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let res = check_status(res)?;
        let body = res
            .json::<GeocodingResponse>()
            .await
            .map_err(ClientError::Internal)?;
        Ok(body.results.unwrap_or_default().into_iter().next())
    }

    /// Fetch the current conditions at a coordinate pair.
    pub async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<CurrentWeather, ClientError> {
        tracing::debug!(
            message = "making current weather request",
            latitude = latitude,
            longitude = longitude,
        );
        let res = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_owned()),
                ("forecast_days", "1".to_owned()),
            ])
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let res = check_status(res)?;
        let body = res
            .json::<ForecastResponse>()
            .await
            .map_err(ClientError::Internal)?;
        Ok(body.current_weather)
    }
}

fn check_status(res: Response) -> Result<Response, ClientError> {
    let status = res.status();
    if status == StatusCode::OK {
        Ok(res)
    } else {
        Err(ClientError::Unexpected(status, res.url().to_string()))
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GeocodingResponse {
    #[serde(alias = "results")]
    pub results: Option<Vec<Location>>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Location {
    #[serde(alias = "latitude")]
    pub latitude: f64,
    #[serde(alias = "longitude")]
    pub longitude: f64,
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "country", default)]
    pub country: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ForecastResponse {
    #[serde(alias = "current_weather")]
    pub current_weather: CurrentWeather,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CurrentWeather {
    #[serde(alias = "temperature")]
    pub temperature: f64,
    #[serde(alias = "windspeed")]
    pub windspeed: f64,
    #[serde(alias = "weathercode")]
    pub weathercode: i64,
}
