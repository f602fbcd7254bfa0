use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::region::RegionLevel;
use crate::view::{Metric, Normalization};

/// Election map CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "electomap", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one round of a data pack to an SVG file
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Data pack: a directory or an http(s) base URL
    pub data: String,

    /// Round identifier, e.g. tur1
    #[arg(long, default_value = "tur1")]
    pub round: String,

    /// Treat the round as having no preloaded data
    #[arg(long)]
    pub no_data: bool,

    /// Fetch from the live endpoints instead of the preloaded pair
    #[arg(long, conflicts_with = "no_data")]
    pub live: bool,

    /// View level: country, county, or uat
    #[arg(long, default_value = "country")]
    pub level: RegionLevel,

    /// Selected county code (required for the uat level)
    #[arg(long)]
    pub parent: Option<String>,

    /// Color metric: turnout, stations, or voters
    #[arg(long, default_value = "turnout")]
    pub metric: Metric,

    /// Band ceiling: relative-to-max or relative-to-total
    #[arg(long, default_value = "relative-to-max")]
    pub normalization: Normalization,

    /// Filter threshold for the selected metric
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Location dataset scope, e.g. abroad
    #[arg(long)]
    pub location: Option<String>,

    /// Surface width in pixels
    #[arg(long, default_value_t = 1200.0)]
    pub width: f64,

    /// Surface height in pixels
    #[arg(long, default_value_t = 800.0)]
    pub height: f64,

    /// Output SVG path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}
