//! FILENAME: app/src/commands.rs
// PURPOSE: One function per subcommand. Results go to the output file when one
// is configured, otherwise to the given writer.

use std::io::Write;

use engine::DataTable;
use rollup_engine::{
    apply_filters, build_breakdown, build_hierarchy, distinct_values, Breakdown, TreeTable,
};

use crate::cli::{BreakdownArgs, ColumnsArgs, Command, TreeArgs};
use crate::config::DrilldownConfig;
use crate::error::AppError;
use crate::logging::{log_enter, log_exit};

pub fn execute(command: &Command, out: &mut dyn Write) -> Result<(), AppError> {
    match command {
        Command::Tree(args) => run_tree(args, out).map(|_| ()),
        Command::Breakdown(args) => run_breakdown(args, out).map(|_| ()),
        Command::Columns(args) => run_columns(args, out).map(|_| ()),
    }
}

/// Loads the configured input and applies the configured filters.
pub fn load_source(config: &DrilldownConfig) -> Result<DataTable, AppError> {
    let path = config.input_path()?;
    let table = persistence::load_table(path, config.sheet.as_deref())?;
    log::info!(
        target: "commands",
        "loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );

    if config.filters.is_empty() {
        return Ok(table);
    }
    let filtered = apply_filters(&table, &config.filters)?;
    log::info!(
        target: "commands",
        "filters kept {} of {} rows",
        filtered.row_count(),
        table.row_count()
    );
    Ok(filtered)
}

pub fn run_tree(args: &TreeArgs, out: &mut dyn Write) -> Result<TreeTable, AppError> {
    log_enter!("commands", "run_tree");

    let mut config = DrilldownConfig::from_source(&args.source)?;
    config.apply_tree_args(args);

    let table = load_source(&config)?;
    let tree = build_hierarchy(&table, &config.hierarchy)?;

    let format = config.output_format();
    match &config.output {
        Some(path) => persistence::save_tree(&tree, path, format)?,
        None => {
            persistence::write_tree(&tree, &mut *out, format)?;
            out.flush()?;
        }
    }

    log_exit!("commands", "run_tree", "nodes={}", tree.len());
    Ok(tree)
}

pub fn run_breakdown(args: &BreakdownArgs, out: &mut dyn Write) -> Result<Breakdown, AppError> {
    log_enter!("commands", "run_breakdown");

    let mut config = DrilldownConfig::from_source(&args.source)?;
    config.apply_breakdown_args(args)?;
    let definition = config
        .breakdown
        .clone()
        .ok_or_else(|| AppError::InvalidArgument("breakdown needs --category and --series".to_string()))?;

    let table = load_source(&config)?;
    let breakdown = build_breakdown(&table, &definition)?;

    let format = config.output_format();
    match &config.output {
        Some(path) => persistence::save_breakdown(&breakdown, path, format)?,
        None => {
            persistence::write_breakdown(&breakdown, &mut *out, format)?;
            out.flush()?;
        }
    }

    log_exit!("commands", "run_breakdown", "cells={}", breakdown.cells.len());
    Ok(breakdown)
}

/// Prints one line per column name, or per distinct value of `--distinct`.
pub fn run_columns(args: &ColumnsArgs, out: &mut dyn Write) -> Result<Vec<String>, AppError> {
    log_enter!("commands", "run_columns");

    let mut config = DrilldownConfig::from_source(&args.source)?;
    config.apply_source(&args.source);
    let table = persistence::load_table(config.input_path()?, config.sheet.as_deref())?;

    let lines: Vec<String> = match &args.distinct {
        None => table.headers().to_vec(),
        Some(column) => distinct_values(&table, column)?
            .iter()
            .map(|v| v.display_value())
            .collect(),
    };

    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    log_exit!("commands", "run_columns", "lines={}", lines.len());
    Ok(lines)
}
