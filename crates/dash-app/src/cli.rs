//! Command line definitions for `dashctl`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dash_core::ChartType;

#[derive(Parser, Debug)]
#[command(
    name = "dashctl",
    version,
    about = "Manage dashboard data sources, filters and visualizations"
)]
pub struct Cli {
    /// JSON configuration file (default: dashctl.json when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Override the state directory from the configuration
    #[arg(long = "state-dir", value_name = "DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a CSV file and make it the active data source
    Load {
        #[arg(value_name = "CSV")]
        path: PathBuf,

        /// Column used by date range filters (guessed when omitted)
        #[arg(long = "date-column", value_name = "COL")]
        date_column: Option<String>,

        #[command(flatten)]
        nulls: NullArgs,
    },

    /// List data sources
    Sources,

    /// Make a data source active
    Activate {
        id: String,
    },

    /// Remove a data source
    RemoveSource {
        id: String,
    },

    /// Show the filter options offered for the active data source
    Options,

    /// Print the active data source's rows that pass the given filters
    Filter(FilterArgs),

    /// Manage visualizations
    #[command(subcommand)]
    Viz(VizCommand),

    /// Re-read a CSV file periodically and keep its data source fresh
    Watch {
        #[arg(value_name = "CSV")]
        path: PathBuf,

        /// Seconds between reads (default from configuration)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        #[command(flatten)]
        nulls: NullArgs,
    },
}

/// Which cell text loads as null
#[derive(Args, Debug, Default, Clone)]
pub struct NullArgs {
    /// Only empty cells are null, instead of the default N/A, null, None and friends
    #[arg(long = "only-empty-null")]
    pub only_empty: bool,

    /// Extra cell text loaded as null, repeatable
    #[arg(long = "null", value_name = "TEXT")]
    pub extra: Vec<String>,

    /// Cell text kept as a value even though it is null by default, repeatable
    #[arg(long = "not-null", value_name = "TEXT")]
    pub keep: Vec<String>,
}

#[derive(Parser, Debug, Default)]
pub struct FilterArgs {
    /// Case-insensitive text searched in every column
    #[arg(long)]
    pub search: Option<String>,

    /// Earliest date, inclusive
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Latest date, inclusive
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,

    /// Allowed values for a column, repeatable
    #[arg(long = "category", value_name = "COL=V1,V2", value_parser = parse_category)]
    pub categories: Vec<(String, Vec<String>)>,

    /// Inclusive numeric range for a column, repeatable
    #[arg(long = "range", value_name = "COL=MIN..MAX", value_parser = parse_range)]
    pub ranges: Vec<(String, f64, f64)>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum VizCommand {
    /// Add a visualization and select it
    Add {
        #[arg(value_name = "TYPE", value_parser = parse_chart_type)]
        chart_type: ChartType,
    },

    /// List visualizations
    List,

    /// Change a visualization
    Update(VizUpdateArgs),

    /// Delete a visualization
    Delete {
        id: String,
    },

    /// Select a visualization, or clear the selection when no id is given
    Select {
        id: Option<String>,
    },

    /// Print the chart data for a visualization
    Show {
        id: String,
    },
}

#[derive(Parser, Debug)]
pub struct VizUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "type", value_name = "TYPE", value_parser = parse_chart_type)]
    pub chart_type: Option<ChartType>,

    /// X axis column
    #[arg(long)]
    pub x: Option<String>,

    /// Y axis column
    #[arg(long)]
    pub y: Option<String>,

    /// Hex colour such as #10b981
    #[arg(long)]
    pub color: Option<String>,

    #[arg(long, value_name = "BOOL")]
    pub grid: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    pub legend: Option<bool>,
}

fn parse_chart_type(value: &str) -> Result<ChartType, String> {
    value.parse::<ChartType>().map_err(|e| e.to_string())
}

/// `Region=US,EU` into the column and its values
fn parse_category(value: &str) -> Result<(String, Vec<String>), String> {
    let (column, values) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COL=V1,V2, got '{}'", value))?;
    if column.is_empty() {
        return Err("column name is empty".to_string());
    }
    let values = values
        .split(',')
        .map(str::to_string)
        .filter(|v| !v.is_empty())
        .collect();
    Ok((column.to_string(), values))
}

/// `Sales=10..250.5` into the column and its bounds
fn parse_range(value: &str) -> Result<(String, f64, f64), String> {
    let (column, bounds) = value
        .split_once('=')
        .ok_or_else(|| format!("expected COL=MIN..MAX, got '{}'", value))?;
    let (min, max) = bounds
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX, got '{}'", bounds))?;

    let min = min
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid minimum '{}': {}", min, e))?;
    let max = max
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid maximum '{}': {}", max, e))?;
    Ok((column.to_string(), min, max))
}
