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

use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failures of the metrics pipeline: appending to or loading from the
/// event logs, and rendering the report.
#[derive(Debug)]
pub enum MetricsError {
    /// A log file or directory could not be read or written.
    Storage {
        path: PathBuf,
        source: Box<dyn error::Error + Send + Sync>,
    },
    /// A persisted record does not parse against its schema. `record` is
    /// 1-based and counts data rows, not the header.
    Corruption {
        path: PathBuf,
        record: u64,
        reason: String,
    },
    /// A chart or the composed document could not be written.
    Render { path: PathBuf, source: io::Error },
}

impl MetricsError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MetricsError::Storage {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage { path, source } => {
                write!(f, "storage error for {}: {}", path.display(), source)
            }
            Self::Corruption { path, record, reason } => {
                write!(f, "corrupt record {} in {}: {}", record, path.display(), reason)
            }
            Self::Render { path, source } => {
                write!(f, "render error for {}: {}", path.display(), source)
            }
        }
    }
}

impl error::Error for MetricsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Storage { source, .. } => Some(source.as_ref()),
            Self::Render { source, .. } => Some(source),
            Self::Corruption { .. } => None,
        }
    }
}
