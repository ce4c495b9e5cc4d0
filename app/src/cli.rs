//! FILENAME: app/src/cli.rs
// PURPOSE: Command-line surface (clap derive) and the flag value parsers.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use persistence::{parse_field, OutputFormat};
use rollup_engine::{ColorColumns, FilterValue, RecordFilter};

#[derive(Parser, Debug)]
#[command(name = "drilldown", version, about)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also append log lines to this file
    #[arg(long, global = true, env = "DRILLDOWN_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the id/parent/value/color tree table
    Tree(TreeArgs),
    /// Build category x series percentages for stacked bars
    Breakdown(BreakdownArgs),
    /// List the columns of a table, or the distinct values of one column
    Columns(ColumnsArgs),
}

/// Where the records come from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Source table (.xlsx, .xls, .ods, .csv or .tsv)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Worksheet name; defaults to the first sheet
    #[arg(long)]
    pub sheet: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Record selection shared by the rollup commands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Keep rows whose column equals one of the values: COL=V1|V2 (empty value matches blanks)
    #[arg(long = "filter", value_name = "COL=V1|V2", value_parser = parse_value_filter)]
    pub filters: Vec<RecordFilter>,

    /// Keep rows whose column lies in an inclusive range: COL=MIN..MAX (either end optional)
    #[arg(long = "range", value_name = "COL=MIN..MAX", value_parser = parse_range_filter)]
    pub ranges: Vec<RecordFilter>,
}

impl FilterArgs {
    pub fn all(&self) -> impl Iterator<Item = &RecordFilter> {
        self.filters.iter().chain(self.ranges.iter())
    }
}

/// Where the result goes.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format; guessed from the output extension when omitted
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TreeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Grouping columns, most specific first: a,b,c
    #[arg(short, long, value_delimiter = ',')]
    pub levels: Vec<String>,

    /// Column summed into each node's value
    #[arg(long)]
    pub value: Option<String>,

    /// Color score columns as NUMERATOR,DENOMINATOR
    #[arg(long, value_name = "NUM,DEN", value_parser = parse_color_columns)]
    pub color: Option<ColorColumns>,

    /// Keep blank level cells as a category with this label instead of failing
    #[arg(long)]
    pub null_label: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BreakdownArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Column whose values become the bars
    #[arg(long)]
    pub category: Option<String>,

    /// Column whose values become the stacked segments
    #[arg(long)]
    pub series: Option<String>,

    /// Column to sum; records are counted when omitted
    #[arg(long)]
    pub value: Option<String>,

    /// Keep blank cells as a category with this label instead of failing
    #[arg(long)]
    pub null_label: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the distinct values of this column instead of the header
    #[arg(long, value_name = "COL")]
    pub distinct: Option<String>,
}

// ============================================================================
// VALUE PARSERS
// ============================================================================

fn split_assignment(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((column, rest)) if !column.trim().is_empty() => Ok((column.trim(), rest)),
        _ => Err(format!("expected COL=..., got '{}'", s)),
    }
}

/// `Gender=Female|Other` keeps rows whose Gender is Female or Other.
/// Values are typed the way delimited input is, so `Age=24` matches the number 24.
pub fn parse_value_filter(s: &str) -> Result<RecordFilter, String> {
    let (column, rest) = split_assignment(s)?;
    let values = rest
        .split('|')
        .map(|v| FilterValue::from(&parse_field(v.trim())))
        .collect();
    Ok(RecordFilter::values(column, values))
}

/// `Age=25..30`, `Age=25..` or `Age=..30`.
pub fn parse_range_filter(s: &str) -> Result<RecordFilter, String> {
    let (column, rest) = split_assignment(s)?;
    let (lo, hi) = rest
        .split_once("..")
        .ok_or_else(|| format!("expected MIN..MAX in '{}'", s))?;

    let bound = |text: &str| -> Result<Option<f64>, String> {
        let text = text.trim();
        if text.is_empty() {
            Ok(None)
        } else {
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| format!("'{}' is not a number", text))
        }
    };

    Ok(RecordFilter::range(column, bound(lo)?, bound(hi)?))
}

pub fn parse_color_columns(s: &str) -> Result<ColorColumns, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [num, den] if !num.is_empty() && !den.is_empty() => Ok(ColorColumns::new(num, den)),
        _ => Err(format!("expected NUMERATOR,DENOMINATOR, got '{}'", s)),
    }
}

pub fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}
