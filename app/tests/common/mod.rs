//! FILENAME: tests/common/mod.rs
//! Fixtures for drilldown integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use drilldown_lib::cli::{BreakdownArgs, ColumnsArgs, SourceArgs, TreeArgs};
use tempfile::TempDir;

pub const SHEET_NAME: &str = "education_career_success";

pub const HEADER: [&str; 8] = [
    "Gender",
    "Field_of_Study",
    "Current_Job_Level",
    "Job_Offers",
    "Soft_Skills_Score",
    "Networking_Score",
    "Entrepreneurship",
    "Age",
];

/// Gender, field, job level, offers, soft skills, networking, entrepreneur, age.
pub const ROWS: [(&str, &str, &str, f64, f64, f64, &str, f64); 5] = [
    ("Male", "Arts", "Entry", 2.0, 6.0, 3.0, "No", 24.0),
    ("Female", "Arts", "Entry", 3.0, 4.0, 5.0, "Yes", 27.0),
    ("Female", "Medicine", "Mid", 5.0, 8.0, 2.0, "No", 31.0),
    ("Male", "Medicine", "Entry", 1.0, 2.0, 2.0, "No", 22.0),
    ("Other", "Arts", "Mid", 4.0, 9.0, 0.0, "Yes", 29.0),
];

/// A small slice of the education/career dataset written into a temp dir.
pub struct EducationFixture {
    pub dir: TempDir,
}

impl EducationFixture {
    pub fn new() -> Self {
        EducationFixture {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_csv(&self) -> PathBuf {
        let path = self.path("education.csv");
        let mut text = HEADER.join(",");
        text.push('\n');
        for (gender, field, level, offers, soft, network, entre, age) in ROWS {
            text.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                gender, field, level, offers, soft, network, entre, age
            ));
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    pub fn write_xlsx(&self) -> PathBuf {
        let path = self.path("education.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).unwrap();
        for (col, name) in HEADER.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        for (i, (gender, field, level, offers, soft, network, entre, age)) in ROWS.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_string(row, 0, *gender).unwrap();
            sheet.write_string(row, 1, *field).unwrap();
            sheet.write_string(row, 2, *level).unwrap();
            sheet.write_number(row, 3, *offers).unwrap();
            sheet.write_number(row, 4, *soft).unwrap();
            sheet.write_number(row, 5, *network).unwrap();
            sheet.write_string(row, 6, *entre).unwrap();
            sheet.write_number(row, 7, *age).unwrap();
        }
        workbook.save(&path).unwrap();
        path
    }

    pub fn write_config(&self, json: &str) -> PathBuf {
        let path = self.path("drilldown.json");
        std::fs::write(&path, json).unwrap();
        path
    }
}

pub fn source(input: &Path) -> SourceArgs {
    SourceArgs {
        input: Some(input.to_path_buf()),
        ..Default::default()
    }
}

pub fn tree_args(input: &Path) -> TreeArgs {
    TreeArgs {
        source: source(input),
        ..Default::default()
    }
}

pub fn breakdown_args(input: &Path, category: &str, series: &str) -> BreakdownArgs {
    BreakdownArgs {
        source: source(input),
        category: Some(category.to_string()),
        series: Some(series.to_string()),
        ..Default::default()
    }
}

pub fn columns_args(input: &Path) -> ColumnsArgs {
    ColumnsArgs {
        source: source(input),
        distinct: None,
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
