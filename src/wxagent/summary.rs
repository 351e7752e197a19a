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

use crate::event::{ErrorEvent, FeedbackEvent, RequestEvent};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// How many errors are carried verbatim into the summary.
const RECENT_ERRORS: usize = 5;
/// How many cities survive the top-cities truncation.
const TOP_CITIES: usize = 10;

/// Aggregate statistics over the full event history. Recomputed from
/// scratch on every report generation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub requests: RequestStats,
    pub feedback: FeedbackStats,
    pub errors: ErrorStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate_pct: f64,
    pub avg_response_time_ms: f64,
    /// Cities by request count, descending, at most ten entries. Ties keep
    /// the order in which each city first appeared in the log so rendered
    /// charts are deterministic.
    pub top_cities: Vec<CityCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub total: u64,
    pub avg_rating: f64,
    /// Count per rating value actually seen. Unseen ratings are absent,
    /// not zero-filled.
    pub rating_distribution: BTreeMap<u8, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorStats {
    pub total: u64,
    pub error_type_distribution: BTreeMap<String, u64>,
    /// The last five errors, in original append order.
    pub recent: Vec<ErrorEvent>,
}

/// Compute a [`Summary`] from in-memory event sequences. Pure: no I/O, no
/// side effects, empty inputs yield zeroed statistics rather than NaN.
pub fn summarize(
    requests: &[RequestEvent],
    feedback: &[FeedbackEvent],
    errors: &[ErrorEvent],
) -> Summary {
    Summary {
        requests: summarize_requests(requests),
        feedback: summarize_feedback(feedback),
        errors: summarize_errors(errors),
    }
}

fn summarize_requests(requests: &[RequestEvent]) -> RequestStats {
    let total = requests.len() as u64;
    let successful = requests.iter().filter(|r| r.weather_found).count() as u64;
    let failed = total - successful;

    let success_rate_pct = if total == 0 {
        0.0
    } else {
        successful as f64 / total as f64 * 100.0
    };
    let avg_response_time_ms = if requests.is_empty() {
        0.0
    } else {
        requests.iter().map(|r| r.response_time_ms).sum::<f64>() / requests.len() as f64
    };

    RequestStats {
        total,
        successful,
        failed,
        success_rate_pct,
        avg_response_time_ms,
        top_cities: top_cities(requests),
    }
}

fn top_cities(requests: &[RequestEvent]) -> Vec<CityCount> {
    // Accumulate in first-seen order, then stable-sort by count so equal
    // counts keep that order.
    let mut counts: Vec<CityCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for request in requests {
        let city = request.city_extracted.trim();
        if city.is_empty() {
            continue;
        }
        match index.get(city) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(city, counts.len());
                counts.push(CityCount {
                    city: city.to_string(),
                    count: 1,
                });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_CITIES);
    counts
}

fn summarize_feedback(feedback: &[FeedbackEvent]) -> FeedbackStats {
    let total = feedback.len() as u64;
    let avg_rating = if feedback.is_empty() {
        0.0
    } else {
        feedback.iter().map(|f| f.rating as f64).sum::<f64>() / feedback.len() as f64
    };

    let mut rating_distribution = BTreeMap::new();
    for event in feedback {
        *rating_distribution.entry(event.rating).or_insert(0) += 1;
    }

    FeedbackStats {
        total,
        avg_rating,
        rating_distribution,
    }
}

fn summarize_errors(errors: &[ErrorEvent]) -> ErrorStats {
    let mut error_type_distribution = BTreeMap::new();
    for event in errors {
        *error_type_distribution.entry(event.error_type.clone()).or_insert(0) += 1;
    }

    let start = errors.len().saturating_sub(RECENT_ERRORS);
    ErrorStats {
        total: errors.len() as u64,
        error_type_distribution,
        recent: errors[start..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(city: &str, found: bool, latency: f64) -> RequestEvent {
        RequestEvent::new("s1", format!("weather in {}", city), "reply", latency, city, found)
    }

    fn feedback(rating: u8) -> FeedbackEvent {
        FeedbackEvent::new("s1", "msg", rating, "", "good")
    }

    fn error(error_type: &str, message: &str) -> ErrorEvent {
        ErrorEvent::new("s1", error_type, message, json!({}))
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let summary = summarize(&[], &[], &[]);
        assert_eq!(summary.requests.total, 0);
        assert_eq!(summary.requests.success_rate_pct, 0.0);
        assert_eq!(summary.requests.avg_response_time_ms, 0.0);
        assert!(summary.requests.top_cities.is_empty());
        assert_eq!(summary.feedback.total, 0);
        assert_eq!(summary.feedback.avg_rating, 0.0);
        assert!(summary.feedback.rating_distribution.is_empty());
        assert_eq!(summary.errors.total, 0);
        assert!(summary.errors.recent.is_empty());
    }

    #[test]
    fn success_rate_counts_weather_found() {
        let requests = vec![
            request("A", true, 100.0),
            request("B", false, 200.0),
            request("C", true, 300.0),
            request("D", true, 400.0),
        ];
        let stats = summarize(&requests, &[], &[]).requests;
        assert_eq!(stats.total, 4);
        assert_eq!(stats.successful, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.successful + stats.failed, 4);
        assert_eq!(stats.success_rate_pct, 75.0);
        assert_eq!(stats.avg_response_time_ms, 250.0);
    }

    #[test]
    fn top_cities_sorted_by_count_descending() {
        let requests: Vec<RequestEvent> = ["A", "B", "A", "C", "B", "A"]
            .iter()
            .map(|c| request(c, true, 1.0))
            .collect();
        let cities = summarize(&requests, &[], &[]).requests.top_cities;
        let got: Vec<(&str, u64)> = cities.iter().map(|c| (c.city.as_str(), c.count)).collect();
        assert_eq!(got, vec![("A", 3), ("B", 2), ("C", 1)]);
    }

    #[test]
    fn top_cities_ties_break_on_first_seen() {
        let requests: Vec<RequestEvent> = ["A", "B", "A", "B", "C"]
            .iter()
            .map(|c| request(c, true, 1.0))
            .collect();
        let cities = summarize(&requests, &[], &[]).requests.top_cities;
        let got: Vec<(&str, u64)> = cities.iter().map(|c| (c.city.as_str(), c.count)).collect();
        assert_eq!(got, vec![("A", 2), ("B", 2), ("C", 1)]);
    }

    #[test]
    fn top_cities_ignores_empty_and_truncates_to_ten() {
        let mut requests = vec![request("", true, 1.0), request("  ", true, 1.0)];
        for i in 0..12 {
            // city0 appears 13 times, city1 12 times, ... so ordering is known
            for _ in 0..(13 - i) {
                requests.push(request(&format!("city{}", i), true, 1.0));
            }
        }
        let cities = summarize(&requests, &[], &[]).requests.top_cities;
        assert_eq!(cities.len(), 10);
        assert_eq!(cities[0].city, "city0");
        assert_eq!(cities[0].count, 13);
        assert_eq!(cities[9].city, "city9");
    }

    #[test]
    fn rating_distribution_is_sparse() {
        let feedback = vec![feedback(5), feedback(5), feedback(2)];
        let stats = summarize(&[], &feedback, &[]).feedback;
        assert_eq!(stats.total, 3);
        assert!((stats.avg_rating - 4.0).abs() < 1e-9);
        assert_eq!(stats.rating_distribution.get(&5), Some(&2));
        assert_eq!(stats.rating_distribution.get(&2), Some(&1));
        assert_eq!(stats.rating_distribution.get(&3), None);
    }

    #[test]
    fn recent_errors_are_last_five_in_order() {
        let errors: Vec<ErrorEvent> = (0..8).map(|i| error("chat_error", &format!("e{}", i))).collect();
        let stats = summarize(&[], &[], &errors).errors;
        assert_eq!(stats.total, 8);
        assert_eq!(stats.error_type_distribution.get("chat_error"), Some(&8));
        let recent: Vec<&str> = stats.recent.iter().map(|e| e.error_message.as_str()).collect();
        assert_eq!(recent, vec!["e3", "e4", "e5", "e6", "e7"]);
    }
}
