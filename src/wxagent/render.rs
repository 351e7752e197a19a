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

use crate::chart;
use crate::error::MetricsError;
use crate::event::{ErrorEvent, FeedbackEvent, RequestEvent};
use crate::summary::Summary;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

pub const DAILY_REQUESTS_CHART: &str = "daily_requests.svg";
pub const TOP_CITIES_CHART: &str = "top_cities.svg";
pub const RESPONSE_TIME_CHART: &str = "response_time_distribution.svg";
pub const FEEDBACK_RATINGS_CHART: &str = "feedback_ratings.svg";
pub const ERROR_TYPES_CHART: &str = "error_types.svg";
pub const DASHBOARD_FILE: &str = "dashboard.html";

/// Histogram bin count for the response-time distribution.
const HISTOGRAM_BINS: usize = 30;

/// Renders the chart artifacts and the composed HTML document into one
/// output directory, overwriting a previous run's files. Every chart is
/// skipped, not failed, when its source data is absent, and the document
/// references only the charts actually produced.
#[derive(Debug)]
pub struct ReportRenderer {
    output_dir: PathBuf,
}

impl ReportRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ReportRenderer {
            output_dir: output_dir.into(),
        }
    }

    /// Write up to five chart files plus `dashboard.html`, returning the
    /// path of the composed document. The document itself is written to a
    /// temporary file and renamed into place so a failed render never
    /// leaves a half-written report behind.
    pub fn render(
        &self,
        summary: &Summary,
        requests: &[RequestEvent],
        feedback: &[FeedbackEvent],
        errors: &[ErrorEvent],
    ) -> Result<PathBuf, MetricsError> {
        let mut charts: Vec<(&'static str, &'static str)> = Vec::new();

        if !requests.is_empty() {
            let daily = daily_counts(requests);
            self.write_chart(
                DAILY_REQUESTS_CHART,
                &chart::line_chart("Daily Requests", "Date", "Requests", &daily),
            )?;
            charts.push(("Daily Requests", DAILY_REQUESTS_CHART));

            if !summary.requests.top_cities.is_empty() {
                let bars: Vec<(String, u64)> = summary
                    .requests
                    .top_cities
                    .iter()
                    .map(|c| (c.city.clone(), c.count))
                    .collect();
                self.write_chart(
                    TOP_CITIES_CHART,
                    &chart::bar_chart("Top 10 Cities", "City", "Requests", &bars, true),
                )?;
                charts.push(("Top Cities", TOP_CITIES_CHART));
            }

            let times: Vec<f64> = requests.iter().map(|r| r.response_time_ms).collect();
            self.write_chart(
                RESPONSE_TIME_CHART,
                &chart::histogram(
                    "Response Time Distribution",
                    "Response Time (ms)",
                    &times,
                    HISTOGRAM_BINS,
                ),
            )?;
            charts.push(("Response Time Distribution", RESPONSE_TIME_CHART));
        }

        if !feedback.is_empty() {
            // BTreeMap iteration gives ratings in ascending order
            let bars: Vec<(String, u64)> = summary
                .feedback
                .rating_distribution
                .iter()
                .map(|(rating, count)| (rating.to_string(), *count))
                .collect();
            self.write_chart(
                FEEDBACK_RATINGS_CHART,
                &chart::bar_chart("Ratings Distribution", "Rating", "Count", &bars, true),
            )?;
            charts.push(("Ratings", FEEDBACK_RATINGS_CHART));
        }

        if !errors.is_empty() {
            let bars: Vec<(String, u64)> = summary
                .errors
                .error_type_distribution
                .iter()
                .map(|(error_type, count)| (error_type.clone(), *count))
                .collect();
            self.write_chart(
                ERROR_TYPES_CHART,
                &chart::bar_chart("Error Types", "Type", "Count", &bars, true),
            )?;
            charts.push(("Error Types", ERROR_TYPES_CHART));
        }

        let html = compose_document(summary, &charts);
        let document = self.output_dir.join(DASHBOARD_FILE);
        let staging = self.output_dir.join(".dashboard.html.tmp");
        fs::write(&staging, html).map_err(|e| MetricsError::Render {
            path: staging.clone(),
            source: e,
        })?;
        fs::rename(&staging, &document).map_err(|e| MetricsError::Render {
            path: document.clone(),
            source: e,
        })?;

        tracing::info!(
            message = "dashboard rendered",
            document = %document.display(),
            charts = charts.len(),
        );
        Ok(document)
    }

    fn write_chart(&self, name: &str, svg: &str) -> Result<(), MetricsError> {
        let path = self.output_dir.join(name);
        fs::write(&path, svg).map_err(|e| MetricsError::Render { path, source: e })
    }
}

/// Requests per calendar date, ascending. Days without requests are not
/// zero-filled: only dates present in the data appear. That matches the
/// previous collector's behavior, uneven x-spacing and all.
fn daily_counts(requests: &[RequestEvent]) -> Vec<(String, u64)> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for request in requests {
        *days.entry(request.timestamp.date()).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(date, count)| (date.format("%Y-%m-%d").to_string(), count))
        .collect()
}

fn compose_document(summary: &Summary, charts: &[(&str, &str)]) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Weather Agent Dashboard</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 20px; }}
.card {{ background:#fff;border:1px solid #ddd;border-radius:8px;padding:16px;margin:12px 0; }}
.value {{ font-size:22px;font-weight:700;color:#0b6; }}
h1 {{ margin-bottom:6px; }}
img {{ max-width:100%; height:auto; }}
</style></head><body>
<h1>Weather Agent Dashboard</h1>
<p>Generated at: {generated_at}</p>

<div class="card">
<h2>Requests</h2>
<p><span class="value">{total_requests}</span> total</p>
<p><span class="value">{successful}</span> success</p>
<p><span class="value">{success_rate:.1}%</span> success rate</p>
<p><span class="value">{avg_latency:.1} ms</span> avg latency</p>
</div>

<div class="card">
<h2>Feedback</h2>
<p><span class="value">{total_feedback}</span> total</p>
<p><span class="value">{avg_rating:.1}</span> avg rating</p>
</div>

<div class="card">
<h2>Errors</h2>
<p><span class="value">{total_errors}</span> total</p>
</div>
"#,
        generated_at = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f"),
        total_requests = summary.requests.total,
        successful = summary.requests.successful,
        success_rate = summary.requests.success_rate_pct,
        avg_latency = summary.requests.avg_response_time_ms,
        total_feedback = summary.feedback.total,
        avg_rating = summary.feedback.avg_rating,
        total_errors = summary.errors.total,
    );

    for (heading, file) in charts {
        let _ = writeln!(
            html,
            r#"<h3>{}</h3><img src="{}" alt="{}"/>"#,
            chart::escape(heading),
            file,
            chart::escape(heading)
        );
    }
    html.push_str("</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::summarize;
    use chrono::NaiveDate;

    fn request_on(day: u32, city: &str, latency: f64) -> RequestEvent {
        let mut event = RequestEvent::new("s1", "weather", "reply", latency, city, true);
        event.timestamp = NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        event
    }

    fn svg_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".svg"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn empty_history_renders_document_with_no_charts() {
        let dir = tempfile::tempdir().unwrap();
        let summary = summarize(&[], &[], &[]);
        let doc = ReportRenderer::new(dir.path())
            .render(&summary, &[], &[], &[])
            .unwrap();

        assert!(doc.ends_with(DASHBOARD_FILE));
        assert!(svg_files(dir.path()).is_empty());

        let html = fs::read_to_string(&doc).unwrap();
        assert!(html.contains(">0</span> total"));
        assert!(html.contains(">0.0%</span> success rate"));
        assert!(html.contains(">0.0 ms</span> avg latency"));
        assert!(!html.contains("<img"));
        assert!(!dir.path().join(".dashboard.html.tmp").exists());
    }

    #[test]
    fn requests_only_produces_exactly_three_charts() {
        let dir = tempfile::tempdir().unwrap();
        let requests = vec![
            request_on(1, "Berlin", 120.0),
            request_on(1, "Oslo", 90.0),
            request_on(3, "Berlin", 150.0),
        ];
        let summary = summarize(&requests, &[], &[]);
        let doc = ReportRenderer::new(dir.path())
            .render(&summary, &requests, &[], &[])
            .unwrap();

        assert_eq!(
            svg_files(dir.path()),
            vec![
                DAILY_REQUESTS_CHART.to_string(),
                RESPONSE_TIME_CHART.to_string(),
                TOP_CITIES_CHART.to_string(),
            ]
        );

        let html = fs::read_to_string(&doc).unwrap();
        assert!(html.contains(DAILY_REQUESTS_CHART));
        assert!(html.contains(TOP_CITIES_CHART));
        assert!(html.contains(RESPONSE_TIME_CHART));
        assert!(!html.contains(FEEDBACK_RATINGS_CHART));
        assert!(!html.contains(ERROR_TYPES_CHART));
    }

    #[test]
    fn daily_chart_skips_absent_days() {
        let requests = vec![
            request_on(1, "Berlin", 1.0),
            request_on(1, "Berlin", 1.0),
            request_on(4, "Berlin", 1.0),
        ];
        let daily = daily_counts(&requests);
        assert_eq!(
            daily,
            vec![
                ("2024-05-01".to_string(), 2),
                ("2024-05-04".to_string(), 1),
            ]
        );
    }

    #[test]
    fn full_history_produces_all_five_charts() {
        let dir = tempfile::tempdir().unwrap();
        let requests = vec![request_on(1, "Berlin", 100.0)];
        let feedback = vec![FeedbackEvent::new("s1", "msg", 4, "", "good")];
        let errors = vec![ErrorEvent::new(
            "s1",
            "chat_error",
            "boom",
            serde_json::json!({}),
        )];
        let summary = summarize(&requests, &feedback, &errors);
        ReportRenderer::new(dir.path())
            .render(&summary, &requests, &feedback, &errors)
            .unwrap();

        assert_eq!(svg_files(dir.path()).len(), 5);
    }

    #[test]
    fn feedback_chart_orders_ratings_ascending() {
        let dir = tempfile::tempdir().unwrap();
        let feedback = vec![
            FeedbackEvent::new("s1", "m", 5, "", "good"),
            FeedbackEvent::new("s2", "m", 1, "", "bad"),
            FeedbackEvent::new("s3", "m", 5, "", "good"),
        ];
        let summary = summarize(&[], &feedback, &[]);
        ReportRenderer::new(dir.path())
            .render(&summary, &[], &feedback, &[])
            .unwrap();

        let svg = fs::read_to_string(dir.path().join(FEEDBACK_RATINGS_CHART)).unwrap();
        let one = svg.find(">1</text>");
        let five = svg.find(">5</text>");
        assert!(one.is_some() && five.is_some());
    }

    #[test]
    fn success_rate_rendered_to_one_decimal() {
        let dir = tempfile::tempdir().unwrap();
        let mut requests = vec![request_on(1, "Berlin", 100.0)];
        requests.push({
            let mut r = request_on(1, "Oslo", 50.0);
            r.weather_found = false;
            r
        });
        requests.push(request_on(2, "Berlin", 150.0));
        let summary = summarize(&requests, &[], &[]);
        let doc = ReportRenderer::new(dir.path())
            .render(&summary, &requests, &[], &[])
            .unwrap();

        let html = fs::read_to_string(&doc).unwrap();
        assert!(html.contains(">66.7%</span> success rate"));
        assert!(html.contains(">100.0 ms</span> avg latency"));
    }
}
