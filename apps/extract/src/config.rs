// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extractor configuration loaded from environment variables.

use std::path::PathBuf;

/// Property sets exported when `IFC_TARGET_PSETS` is not set.
pub const DEFAULT_TARGET_PSETS: [&str; 7] = [
    "Pset_ElementShading",
    "Pset_ProductRequirements",
    "Pset_QuantityTakeOff",
    "Pset_ReinforcementBarPitchOfSlab",
    "Pset_SlabCommon",
    "Pset_ReinforcementBarPitchOfWall",
    "Pset_WallCommon",
];

/// Extractor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// IFC file to read.
    pub input: PathBuf,
    /// JSON dump to write.
    pub output: PathBuf,
    /// Property set names to keep, in no particular order.
    pub target_psets: Vec<String>,
    /// Optional per-element documents file; skipped when unset.
    pub docs_output: Option<PathBuf>,
    /// Number of worker threads for reshaping elements.
    pub worker_threads: usize,
    /// Emit logs as JSON lines instead of text.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            input: var("IFC_INPUT")
                .unwrap_or_else(|| "models/building.ifc".into())
                .into(),
            output: var("IFC_OUTPUT").unwrap_or_else(|| "ifc_full.json".into()).into(),
            target_psets: var("IFC_TARGET_PSETS")
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|| DEFAULT_TARGET_PSETS.iter().map(|s| s.to_string()).collect()),
            docs_output: var("IFC_DOCS_OUTPUT")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            worker_threads: var("WORKER_THREADS")
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
            log_json: var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
