// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use easel::{coordinates, ChartPipeline, ChartSpecification, FallbackSynthesizer, GenericChartDetector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Turn an assistant response into a chart spec.
    Process {
        /// Response file; stdin when omitted.
        input: Option<PathBuf>,
        #[arg(long, short, default_value = "")]
        message: String,
        /// Synthesize a placeholder when nothing is extracted.
        #[arg(long, default_value_t = false)]
        fallback: bool,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check a chart spec JSON for generic filler data.
    Detect {
        spec: PathBuf,
        #[arg(long, short, default_value = "")]
        message: String,
    },
    /// Detect, normalize and validate a coordinate trajectory JSON.
    Coordinates { input: Option<PathBuf> },
}

#[derive(Parser, Debug, Clone)]
#[command(name = "easel-demo")]
#[command(about = "Extract chart specifications from free-form assistant responses.")]
struct Cli {
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Pipeline YAML configuration.
    #[arg(long, env = "EASEL_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let filter = if args.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let pipeline = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading pipeline config");
            ChartPipeline::from_config_file(path)?
        }
        None => ChartPipeline::new(),
    };

    match args.command {
        Commands::Process {
            input,
            message,
            fallback,
            seed,
        } => {
            let response = read_input(input.as_deref())?;
            let outcome = if fallback {
                let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
                let mut synthesizer = FallbackSynthesizer::with_rng(rng)
                    .with_config(pipeline.config().fallback.clone());
                pipeline.process_with_fallback(&response, &message, &mut synthesizer)
            } else {
                pipeline.process(&response, &message)
            };
            info!(
                confidence = outcome.analysis.confidence,
                chart = %outcome.analysis.suggested_chart_type,
                "Analysis complete"
            );
            match outcome.spec {
                Some(spec) => println!("{}", spec.to_json_pretty()?),
                None => warn!("No chart could be produced"),
            }
        }
        Commands::Detect { spec, message } => {
            let raw = read_input(Some(&spec))?;
            let chart = ChartSpecification::from_json(&raw)?;
            match GenericChartDetector.detect(&chart, &message) {
                Some(reason) => println!("generic: {reason}"),
                None => println!("chart looks specific to the request"),
            }
        }
        Commands::Coordinates { input } => {
            let raw = read_input(input.as_deref())?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let report = coordinates::validate(&value);
            if let Some(pairs) = coordinates::parse_coordinates(&value) {
                info!(format = %coordinates::detect_format(&pairs), "Detected coordinate order");
                println!("{}", serde_json::to_string(&coordinates::normalize(&pairs))?);
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
