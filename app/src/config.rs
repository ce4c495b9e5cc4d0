//! FILENAME: app/src/config.rs
// PURPOSE: JSON configuration file and its merge with command-line flags.

use std::path::{Path, PathBuf};

use persistence::OutputFormat;
use rollup_engine::{BreakdownDefinition, ColorColumns, HierarchyDefinition, NullKeyPolicy, RecordFilter};
use serde::{Deserialize, Serialize};

use crate::cli::{BreakdownArgs, FilterArgs, OutputArgs, SourceArgs, TreeArgs};
use crate::error::AppError;

pub const DEFAULT_LEVELS: [&str; 3] = ["Current_Job_Level", "Field_of_Study", "Gender"];
pub const DEFAULT_VALUE_COLUMN: &str = "Job_Offers";
pub const DEFAULT_COLOR_NUMERATOR: &str = "Soft_Skills_Score";
pub const DEFAULT_COLOR_DENOMINATOR: &str = "Networking_Score";

/// Everything a run needs besides the command itself.
/// Missing top-level fields fall back to the built-in defaults. A `hierarchy`
/// that is present replaces the default one and must be complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrilldownConfig {
    pub input: Option<PathBuf>,
    /// None selects the first sheet.
    pub sheet: Option<String>,
    pub hierarchy: HierarchyDefinition,
    pub breakdown: Option<BreakdownDefinition>,
    pub filters: Vec<RecordFilter>,
    pub output: Option<PathBuf>,
    pub format: Option<OutputFormat>,
}

impl Default for DrilldownConfig {
    fn default() -> Self {
        DrilldownConfig {
            input: None,
            sheet: None,
            hierarchy: HierarchyDefinition::new(
                &DEFAULT_LEVELS,
                DEFAULT_VALUE_COLUMN,
                ColorColumns::new(DEFAULT_COLOR_NUMERATOR, DEFAULT_COLOR_DENOMINATOR),
            ),
            breakdown: None,
            filters: Vec::new(),
            output: None,
            format: None,
        }
    }
}

impl DrilldownConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let config: DrilldownConfig = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        log::debug!(target: "config", "loaded {}", path.display());
        Ok(config)
    }

    /// The file named by `--config`, or the defaults.
    pub fn from_source(source: &SourceArgs) -> Result<Self, AppError> {
        match &source.config {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn apply_source(&mut self, source: &SourceArgs) {
        if let Some(input) = &source.input {
            self.input = Some(input.clone());
        }
        if let Some(sheet) = &source.sheet {
            self.sheet = Some(sheet.clone());
        }
    }

    /// Command-line filters are added to the configured ones.
    fn apply_filters(&mut self, filter: &FilterArgs) {
        self.filters.extend(filter.all().cloned());
    }

    fn apply_output(&mut self, output: &OutputArgs) {
        if let Some(path) = &output.output {
            self.output = Some(path.clone());
        }
        if let Some(format) = output.format {
            self.format = Some(format);
        }
    }

    pub fn apply_tree_args(&mut self, args: &TreeArgs) {
        self.apply_source(&args.source);
        if !args.levels.is_empty() {
            self.hierarchy.levels = args.levels.clone();
        }
        if let Some(value) = &args.value {
            self.hierarchy.value_column = value.clone();
        }
        if let Some(color) = &args.color {
            self.hierarchy.color_columns = color.clone();
        }
        if let Some(label) = &args.null_label {
            self.hierarchy.null_keys = NullKeyPolicy::Category { label: label.clone() };
        }
        self.apply_filters(&args.filter);
        self.apply_output(&args.output);
    }

    /// Fails when neither the file nor the flags name a category and a series.
    pub fn apply_breakdown_args(&mut self, args: &BreakdownArgs) -> Result<(), AppError> {
        self.apply_source(&args.source);

        let mut breakdown = match (self.breakdown.take(), &args.category, &args.series) {
            (Some(existing), _, _) => existing,
            (None, Some(category), Some(series)) => BreakdownDefinition::counting(category, series),
            (None, _, _) => {
                return Err(AppError::InvalidArgument(
                    "breakdown needs --category and --series".to_string(),
                ))
            }
        };
        if let Some(category) = &args.category {
            breakdown.category = category.clone();
        }
        if let Some(series) = &args.series {
            breakdown.series = series.clone();
        }
        if let Some(value) = &args.value {
            breakdown.value_column = Some(value.clone());
        }
        if let Some(label) = &args.null_label {
            breakdown.null_keys = NullKeyPolicy::Category { label: label.clone() };
        }
        self.breakdown = Some(breakdown);

        self.apply_filters(&args.filter);
        self.apply_output(&args.output);
        Ok(())
    }

    pub fn input_path(&self) -> Result<&Path, AppError> {
        self.input
            .as_deref()
            .ok_or_else(|| AppError::InvalidArgument("no input file given (use --input)".to_string()))
    }

    /// Flag or config format first, then the output extension, then CSV.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .or_else(|| self.output.as_deref().map(OutputFormat::from_path))
            .unwrap_or_default()
    }
}
