// Copyright 2025 Compbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Workload artifact types.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// One generated input file, addressable by its storage location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadArtifact {
    /// Zero-based position in the generated sequence.
    pub index: usize,
    /// Location on durable storage.
    pub path: PathBuf,
}

impl WorkloadArtifact {
    /// Create a new artifact descriptor.
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Storage location of this artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Size class of each generated artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadSize {
    /// A single template block per artifact.
    #[default]
    Small,
    /// Ten template blocks per artifact.
    Medium,
    /// Fifty template blocks per artifact.
    Large,
}

impl WorkloadSize {
    /// Number of template blocks written into one artifact.
    pub fn blocks(&self) -> usize {
        match self {
            Self::Small => 1,
            Self::Medium => 10,
            Self::Large => 50,
        }
    }

    /// Lowercase name used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl std::fmt::Display for WorkloadSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadSize {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(Self::Small),
            "medium" | "m" => Ok(Self::Medium),
            "large" | "l" => Ok(Self::Large),
            _ => Err(HarnessError::invalid_argument(format!(
                "unknown workload size '{}'",
                s
            ))),
        }
    }
}
