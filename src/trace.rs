//! Captured touch traces: the JSON stream format fed to `replay`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::classifier::{DisplayMode, Viewport};
use crate::tracker::TouchSample;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse trace {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("trace has no samples")]
    Empty,
    #[error("trace viewport must have positive dimensions, got {width}x{height}")]
    BadViewport { width: f32, height: f32 },
    #[error("sample {index} goes back in time ({t_ms} ms after {prev_ms} ms)")]
    OutOfOrder {
        index: usize,
        t_ms: u64,
        prev_ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSample {
    #[serde(flatten)]
    pub sample: TouchSample,
    /// Display-mode switch taking effect at this sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<DisplayMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub viewport: Viewport,
    #[serde(default)]
    pub mode: DisplayMode,
    pub samples: Vec<TraceSample>,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let txt = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trace: Trace = serde_json::from_str(&txt).map_err(|source| TraceError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        if self.samples.is_empty() {
            return Err(TraceError::Empty);
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(TraceError::BadViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        let mut prev_ms = 0u64;
        for (index, s) in self.samples.iter().enumerate() {
            if index > 0 && s.sample.t_ms < prev_ms {
                return Err(TraceError::OutOfOrder {
                    index,
                    t_ms: s.sample.t_ms,
                    prev_ms,
                });
            }
            prev_ms = s.sample.t_ms;
        }
        Ok(())
    }
}
