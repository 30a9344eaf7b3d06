#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for clinic site market analysis.
//!
//! Loads the region, facility, and review datasets named on the command
//! line or in a TOML config file, then analyzes one coordinate and prints
//! the report as JSON or text.

mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use config::CliConfig;
use site_insight_analytics_models::{AnalysisRequest, BaselineMethod};
use site_insight_report::{DatasetPaths, Datasets, analyze, render::render_text};
use site_insight_sentiment::IssueTaxonomy;

#[derive(Parser)]
#[command(name = "site_insight", about = "Clinic site market analysis")]
struct Cli {
    /// TOML file with dataset paths and analysis defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the market around a coordinate
    Analyze {
        #[command(flatten)]
        location: Location,
        #[command(flatten)]
        datasets: DatasetArgs,
        /// Radius in kilometres (recommended 0.5 to 10)
        #[arg(long)]
        radius_km: Option<f64>,
        /// Reduction for region-wide baselines (`mean` or `median`)
        #[arg(long)]
        baseline: Option<BaselineMethod>,
        /// Keep facilities that share a name and address
        #[arg(long)]
        no_dedup: bool,
        /// Restrict support facilities to keyword-matched hospitals and
        /// walk-in clinics
        #[arg(long)]
        support_filter: bool,
        /// Drop competitors rated below this value
        #[arg(long)]
        min_rating: Option<f64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Print the region unit containing a coordinate
    Resolve {
        #[command(flatten)]
        location: Location,
        /// Region dataset (CSV or `GeoJSON`)
        #[arg(long)]
        region: Option<PathBuf>,
    },
    /// List the built-in review issue categories
    Issues,
}

#[derive(Args)]
struct Location {
    /// Latitude (WGS84)
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// Longitude (WGS84)
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

#[derive(Args)]
struct DatasetArgs {
    /// Region dataset (CSV or `GeoJSON`)
    #[arg(long)]
    region: Option<PathBuf>,
    /// Competitor facilities (CSV or `GeoJSON`)
    #[arg(long)]
    competitors: Option<PathBuf>,
    /// Support facilities (CSV or `GeoJSON`)
    #[arg(long)]
    support: Option<PathBuf>,
    /// Reviews (CSV)
    #[arg(long)]
    reviews: Option<PathBuf>,
}

impl DatasetArgs {
    fn over(self, base: DatasetPaths) -> DatasetPaths {
        DatasetPaths {
            region: self.region.or(base.region),
            competitors: self.competitors.or(base.competitors),
            support: self.support.or(base.support),
            reviews: self.reviews.or(base.reviews),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = cli
        .config
        .as_deref()
        .map(CliConfig::load)
        .transpose()?
        .unwrap_or_default();

    match cli.command {
        Commands::Analyze {
            location,
            datasets,
            radius_km,
            baseline,
            no_dedup,
            support_filter,
            min_rating,
            format,
        } => {
            let defaults = config.analysis;
            let request = AnalysisRequest {
                latitude: location.lat,
                longitude: location.lon,
                radius_km: radius_km.unwrap_or(defaults.radius_km),
                baseline_method: baseline.unwrap_or(defaults.baseline_method),
                dedup_facilities: defaults.dedup_facilities && !no_dedup,
                support_keyword_filter: defaults.support_keyword_filter || support_filter,
                min_competitor_rating: min_rating.or(defaults.min_competitor_rating),
            };

            let paths = datasets.over(config.datasets);
            if paths.region.is_none() {
                return Err("A region dataset is required (--region or [datasets].region)".into());
            }
            let datasets = Datasets::load(&paths)?;

            let Some(report) = analyze(&datasets, &request)? else {
                return Err(format!(
                    "({}, {}) is not inside any region unit",
                    request.latitude, request.longitude
                )
                .into());
            };

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Text => print!("{}", render_text(&report)),
            }
        }
        Commands::Resolve { location, region } => {
            let Some(path) = region.or(config.datasets.region) else {
                return Err("A region dataset is required (--region or [datasets].region)".into());
            };
            let store = site_insight_ingest::load_region(&path)?;
            match store.resolve(location.lat, location.lon) {
                Some(unit_id) => println!("{unit_id}"),
                None => {
                    log::warn!("({}, {}) is not inside any region unit", location.lat, location.lon);
                    std::process::exit(1);
                }
            }
        }
        Commands::Issues => {
            let taxonomy = IssueTaxonomy::embedded()?;
            for category in taxonomy.categories() {
                println!("{}", category.name());
            }
        }
    }

    Ok(())
}
