//! Command-line entry point for the URDB residential rate analyzer.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use tracing::error;
use tracing_subscriber::EnvFilter;

use urdb_rates::config::{AnalysisConfig, ConfigLoader};
use urdb_rates::error::{RateError, RateResult};
use urdb_rates::models::{OwnershipFilter, Season};
use urdb_rates::pipeline::run_analysis;
use urdb_rates::report::{OutputFormat, write_report};

/// Rank residential electricity tariffs by effective cents per kWh.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URDB CSV export
    #[arg(long)]
    urdb: Option<PathBuf>,

    /// ZIP mapping file for investor-owned utilities
    #[arg(long)]
    iou: Option<PathBuf>,

    /// ZIP mapping file for all other utilities
    #[arg(long)]
    non_iou: Option<PathBuf>,

    /// Two-letter state code to restrict the report to
    #[arg(long)]
    state: Option<String>,

    /// Ownership class: any, iou, or non-iou
    #[arg(long, value_parser = parse_ownership)]
    ownership: Option<OwnershipFilter>,

    /// Only report utilities serving this ZIP code
    #[arg(long)]
    zip: Option<String>,

    /// Average household demand in kW
    #[arg(long)]
    load_kw: Option<Decimal>,

    /// Season used to pick an energy period: default, summer, or winter
    #[arg(long, value_parser = parse_season)]
    season: Option<Season>,

    /// Date tariffs must be active on (YYYY-MM-DD); defaults to today
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl Args {
    fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(path) = &self.urdb {
            config.inputs.urdb = path.clone();
        }
        if let Some(path) = &self.iou {
            config.inputs.iou_zip_map = path.clone();
        }
        if let Some(path) = &self.non_iou {
            config.inputs.non_iou_zip_map = path.clone();
        }
        if let Some(state) = &self.state {
            config.scope.state = Some(state.clone());
        }
        if let Some(ownership) = self.ownership {
            config.scope.ownership = ownership;
        }
        if let Some(zip) = &self.zip {
            config.scope.zip = Some(zip.clone());
        }
        if let Some(kw) = self.load_kw {
            config.load.average_kw = kw;
        }
        if let Some(season) = self.season {
            config.load.season = season;
        }
        if let Some(date) = self.reference_date {
            config.reference_date = Some(date);
        }
    }
}

fn parse_ownership(raw: &str) -> Result<OwnershipFilter, String> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "any" | "all" => Ok(OwnershipFilter::Any),
        "iou" | "investor_owned" => Ok(OwnershipFilter::InvestorOwned),
        "non_iou" | "non_investor_owned" => Ok(OwnershipFilter::NonInvestorOwned),
        other => Err(format!("unknown ownership class '{other}'")),
    }
}

fn parse_season(raw: &str) -> Result<Season, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "default" => Ok(Season::Default),
        "summer" => Ok(Season::Summer),
        "winter" => Ok(Season::Winter),
        other => Err(format!("unknown season '{other}'")),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("urdb_rates=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> RateResult<()> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load(path)?,
        None => AnalysisConfig::default(),
    };
    args.apply_overrides(&mut config);
    let config = config.normalized()?;

    let report = run_analysis(&config)?;

    match &args.out {
        Some(path) => {
            let file = File::create(path).map_err(|e| RateError::Output {
                message: format!("{}: {e}", path.display()),
            })?;
            write_report(&report, args.format, BufWriter::new(file))
        }
        None => write_report(&report, args.format, io::stdout().lock()),
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Rate analysis failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "urdb-rates",
            "--urdb",
            "data/usurdb.csv",
            "--state",
            "ma",
            "--ownership",
            "non-iou",
            "--load-kw",
            "1.5",
            "--season",
            "summer",
            "--reference-date",
            "2024-06-01",
            "--format",
            "json",
        ]);
        let mut config = AnalysisConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.inputs.urdb, PathBuf::from("data/usurdb.csv"));
        assert_eq!(config.scope.state.as_deref(), Some("ma"));
        assert_eq!(config.scope.ownership, OwnershipFilter::NonInvestorOwned);
        assert_eq!(config.load.average_kw.to_string(), "1.5");
        assert_eq!(config.load.season, Season::Summer);
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_ownership_is_rejected() {
        assert!(parse_ownership("coop").is_err());
        assert_eq!(parse_ownership("IOU"), Ok(OwnershipFilter::InvestorOwned));
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let args = Args::parse_from(["urdb-rates"]);
        let mut config = AnalysisConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(args.format, OutputFormat::Table);
    }
}
