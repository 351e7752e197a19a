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

//! Conversational weather lookup service with an operational metrics dashboard.
//!
//! ## Features
//!
//! `wxagent` answers simple weather questions ("weather in Berlin", or just
//! "Berlin") by geocoding the city and fetching current conditions from the
//! [Open-Meteo] APIs. Every interaction is recorded to an append-only event
//! log, and a static HTML dashboard with charts can be generated from that
//! log at any time.
//!
//! Three event kinds are collected under the metrics directory, one CSV
//! file per kind:
//!
//! * `requests.csv` - one record per chat interaction, with latency, the
//!   extracted city and whether a forecast was found.
//! * `feedback.csv` - user ratings (1-5) of replies.
//! * `errors.csv` - failures observed while serving requests.
//!
//! [Open-Meteo]: https://open-meteo.com/
//!
//! ## Usage
//!
//! ### Serving
//!
//! ```text
//! wxagent --bind 0.0.0.0:8000 --metrics-dir metrics
//! ```
//!
//! Endpoints:
//!
//! * `POST /chat` - `{"session_id": "...", "message": "weather in Berlin"}`
//! * `POST /feedback` - `{"session_id": "...", "message": "...", "rating": 4}`
//! * `GET /metrics` - aggregate statistics as JSON
//! * `POST /dashboard/generate` - render the HTML dashboard
//! * `GET /health`
//!
//! ### Reports
//!
//! The dashboard can also be generated offline from the same logs:
//!
//! ```text
//! wxagent_report --metrics-dir metrics --output-dir dashboard
//! ```
//!
//! This writes up to five SVG charts (daily request counts, top cities,
//! response-time distribution, rating distribution, error types) and a
//! `dashboard.html` page embedding the charts that were produced, then
//! prints the absolute path of the page.

pub mod agent;
pub mod chart;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod event;
pub mod http;
pub mod render;
pub mod store;
pub mod summary;
