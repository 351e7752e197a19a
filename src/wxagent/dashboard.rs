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

use crate::error::MetricsError;
use crate::render::ReportRenderer;
use crate::store::EventStore;
use crate::summary;
use std::fs;
use std::path::PathBuf;

/// Orchestration of one report generation: load the full event history,
/// summarize it, render the report. Nothing else lives here.
#[derive(Debug)]
pub struct Dashboard {
    metrics_dir: PathBuf,
    output_dir: PathBuf,
}

impl Dashboard {
    pub fn new(metrics_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Dashboard {
            metrics_dir: metrics_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Generate the report, creating the output directory if needed, and
    /// return the path of the composed document.
    pub fn generate(&self) -> Result<PathBuf, MetricsError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| MetricsError::Render {
            path: self.output_dir.clone(),
            source: e,
        })?;

        let store = EventStore::new(&self.metrics_dir)?;
        let requests = store.load_requests()?;
        let feedback = store.load_feedback()?;
        let errors = store.load_errors()?;
        tracing::debug!(
            message = "event history loaded",
            requests = requests.len(),
            feedback = feedback.len(),
            errors = errors.len(),
        );

        let summary = summary::summarize(&requests, &feedback, &errors);
        ReportRenderer::new(&self.output_dir).render(&summary, &requests, &feedback, &errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{FeedbackEvent, RequestEvent};
    use crate::render::DASHBOARD_FILE;

    #[test]
    fn generate_creates_output_dir_and_document() {
        let dir = tempfile::tempdir().unwrap();
        let metrics_dir = dir.path().join("metrics");
        let output_dir = dir.path().join("reports").join("latest");

        let store = EventStore::new(&metrics_dir).unwrap();
        store
            .append_request(&RequestEvent::new("s1", "weather in Oslo", "Oslo: 12°C", 42.0, "Oslo", true))
            .unwrap();
        store
            .append_feedback(&FeedbackEvent::new("s1", "weather in Oslo", 5, "", "good"))
            .unwrap();

        let document = Dashboard::new(&metrics_dir, &output_dir).generate().unwrap();
        assert_eq!(document, output_dir.join(DASHBOARD_FILE));
        assert!(document.exists());
    }

    #[test]
    fn generate_with_empty_metrics_dir_still_produces_document() {
        let dir = tempfile::tempdir().unwrap();
        let document = Dashboard::new(dir.path().join("none"), dir.path().join("out"))
            .generate()
            .unwrap();
        assert!(document.exists());
    }

    #[test]
    fn generate_surfaces_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let metrics_dir = dir.path().join("metrics");
        std::fs::create_dir_all(&metrics_dir).unwrap();
        std::fs::write(
            metrics_dir.join("requests.csv"),
            "timestamp,session_id,message,response,response_time_ms,city_extracted,weather_found\n\
             garbage,s1,hi,reply,二十,Oslo,True\n",
        )
        .unwrap();

        let err = Dashboard::new(&metrics_dir, dir.path().join("out"))
            .generate()
            .unwrap_err();
        assert!(matches!(err, MetricsError::Corruption { .. }));
    }
}
