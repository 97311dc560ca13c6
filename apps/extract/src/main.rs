// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ifc-glance-extract` - no flags; see the crate docs for the variables.

use anyhow::Context;
use ifc_glance_extract::{run, Config};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::from_env();

    // Initialize logging
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match try_main(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error extracting IFC data: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        input = %config.input.display(),
        output = %config.output.display(),
        target_psets = config.target_psets.len(),
        worker_threads = config.worker_threads,
        "Starting IFC-Glance Extract"
    );

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("failed to initialize rayon thread pool")?;

    let summary = run(config).with_context(|| format!("extracting {}", config.input.display()))?;
    tracing::info!(
        elements = summary.elements,
        with_property_sets = summary.with_property_sets,
        "done"
    );
    Ok(())
}
