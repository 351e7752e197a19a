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
use crate::event::{ErrorEvent, FeedbackEvent, RequestEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::{fs, io};

pub const REQUESTS_FILE: &str = "requests.csv";
pub const FEEDBACK_FILE: &str = "feedback.csv";
pub const ERRORS_FILE: &str = "errors.csv";

const REQUESTS_HEADER: [&str; 7] = [
    "timestamp",
    "session_id",
    "message",
    "response",
    "response_time_ms",
    "city_extracted",
    "weather_found",
];
const FEEDBACK_HEADER: [&str; 6] = [
    "timestamp",
    "session_id",
    "message",
    "rating",
    "feedback_text",
    "response_quality",
];
const ERRORS_HEADER: [&str; 5] = [
    "timestamp",
    "session_id",
    "error_type",
    "error_message",
    "request_data",
];

/// Append-only store for the three event logs, one CSV file per kind
/// under a metrics directory.
///
/// Appends to the same log are serialized behind a per-kind mutex so
/// concurrent producers never interleave partial records. Loads take the
/// same lock and therefore always observe whole records. Events are never
/// mutated or compacted once written.
#[derive(Debug)]
pub struct EventStore {
    metrics_dir: PathBuf,
    requests_lock: Mutex<()>,
    feedback_lock: Mutex<()>,
    errors_lock: Mutex<()>,
}

impl EventStore {
    /// Open a store rooted at `metrics_dir`, creating the directory if it
    /// does not exist. Log files themselves are created lazily on first
    /// append, each starting with its header row.
    pub fn new(metrics_dir: impl Into<PathBuf>) -> Result<Self, MetricsError> {
        let metrics_dir = metrics_dir.into();
        fs::create_dir_all(&metrics_dir).map_err(|e| MetricsError::storage(&metrics_dir, e))?;
        Ok(EventStore {
            metrics_dir,
            requests_lock: Mutex::new(()),
            feedback_lock: Mutex::new(()),
            errors_lock: Mutex::new(()),
        })
    }

    pub fn metrics_dir(&self) -> &Path {
        &self.metrics_dir
    }

    pub fn append_request(&self, event: &RequestEvent) -> Result<(), MetricsError> {
        self.append(&self.requests_lock, REQUESTS_FILE, &REQUESTS_HEADER, event)
    }

    pub fn append_feedback(&self, event: &FeedbackEvent) -> Result<(), MetricsError> {
        self.append(&self.feedback_lock, FEEDBACK_FILE, &FEEDBACK_HEADER, event)
    }

    pub fn append_error(&self, event: &ErrorEvent) -> Result<(), MetricsError> {
        self.append(&self.errors_lock, ERRORS_FILE, &ERRORS_HEADER, event)
    }

    /// Read the full request log in append order. A missing file is an
    /// empty history, not an error.
    pub fn load_requests(&self) -> Result<Vec<RequestEvent>, MetricsError> {
        self.load(&self.requests_lock, REQUESTS_FILE)
    }

    pub fn load_feedback(&self) -> Result<Vec<FeedbackEvent>, MetricsError> {
        self.load(&self.feedback_lock, FEEDBACK_FILE)
    }

    pub fn load_errors(&self) -> Result<Vec<ErrorEvent>, MetricsError> {
        self.load(&self.errors_lock, ERRORS_FILE)
    }

    fn append<T: Serialize>(
        &self,
        lock: &Mutex<()>,
        file_name: &str,
        header: &[&str],
        event: &T,
    ) -> Result<(), MetricsError> {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.metrics_dir.join(file_name);
        let newly_created = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| MetricsError::storage(&path, e))?;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if newly_created {
            writer
                .write_record(header)
                .map_err(|e| csv_storage_error(&path, e))?;
        }
        writer
            .serialize(event)
            .map_err(|e| csv_storage_error(&path, e))?;
        writer.flush().map_err(|e| MetricsError::storage(&path, e))?;
        Ok(())
    }

    fn load<T: DeserializeOwned>(
        &self,
        lock: &Mutex<()>,
        file_name: &str,
    ) -> Result<Vec<T>, MetricsError> {
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let path = self.metrics_dir.join(file_name);
        if !path.exists() {
            tracing::debug!(message = "event log not present, empty history", path = %path.display());
            return Ok(Vec::new());
        }

        let file = File::open(&path).map_err(|e| MetricsError::storage(&path, e))?;
        let mut reader = csv::Reader::from_reader(file);
        let mut events = Vec::new();
        for (index, row) in reader.deserialize().enumerate() {
            let event: T = row.map_err(|e| {
                let reason = e.to_string();
                match e.into_kind() {
                    csv::ErrorKind::Io(io_err) => MetricsError::Storage {
                        path: path.clone(),
                        source: Box::new(io_err),
                    },
                    _ => MetricsError::Corruption {
                        path: path.clone(),
                        record: index as u64 + 1,
                        reason,
                    },
                }
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

fn csv_storage_error(path: &Path, error: csv::Error) -> MetricsError {
    match error.into_kind() {
        csv::ErrorKind::Io(io_err) => MetricsError::storage(path, io_err),
        other => MetricsError::storage(path, io::Error::new(io::ErrorKind::Other, format!("{:?}", other))),
    }
}
