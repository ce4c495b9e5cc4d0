//! FILENAME: tests/test_tree_command.rs
//! Integration tests for the tree command.

mod common;

use common::*;
use drilldown_lib::cli::{FilterArgs, OutputArgs};
use drilldown_lib::{run_tree, AppError};
use persistence::{load_table, OutputFormat, PersistenceError, TREE_SHEET_NAME};
use rollup_engine::{ColorColumns, RecordFilter, RollupError, ROOT_ID};

fn stdout_lines(out: Vec<u8>) -> Vec<String> {
    String::from_utf8(out).unwrap().lines().map(String::from).collect()
}

// ============================================================================
// DEFAULT HIERARCHY
// ============================================================================

#[test]
fn test_default_hierarchy_to_stdout() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let mut out = Vec::new();
    let tree = run_tree(&tree_args(&input), &mut out).unwrap();
    let lines = stdout_lines(out);

    assert_eq!(tree.len(), 14);
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[0], "id,parent,value,color");
    assert_eq!(lines[1], "Entry,Arts,3,0.8");
    assert_eq!(lines[2], "Entry,Arts,2,2");
    assert_eq!(lines[3], "Entry,Medicine,1,1");
    assert_eq!(lines[4], "Mid,Arts,4,");
    assert_eq!(lines[5], "Mid,Medicine,5,4");
    assert_eq!(lines[6], "Arts,Female,3,0.8");
    assert_eq!(lines[8], "Arts,Other,4,");
    assert_eq!(lines[10], "Medicine,Male,1,1");
    assert!(lines[11].starts_with("Female,total,8,1.714285"));
    assert_eq!(lines[12], "Male,total,3,1.6");
    assert_eq!(lines[13], "Other,total,4,");
    assert!(lines[14].starts_with("total,,15,2.41666"));
}

#[test]
fn test_values_conserved_per_level() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let tree = run_tree(&tree_args(&input), &mut Vec::new()).unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.id, ROOT_ID);
    assert_eq!(root.value, 15.0);
    for level in 0..tree.level_count() {
        let sum: f64 = tree.level(level).iter().map(|n| n.value).sum();
        assert!(approx(sum, root.value));
    }
}

#[test]
fn test_same_field_under_each_gender() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let tree = run_tree(&tree_args(&input), &mut Vec::new()).unwrap();
    let female_arts = tree.find(&["Female", "Arts"]).unwrap();
    let male_arts = tree.find(&["Male", "Arts"]).unwrap();
    assert_eq!(female_arts.value, 3.0);
    assert_eq!(male_arts.value, 2.0);
    assert!(approx(tree.find(&["Female"]).unwrap().color, 12.0 / 7.0));
}

// ============================================================================
// FLAGS
// ============================================================================

#[test]
fn test_custom_levels_and_color() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let mut args = tree_args(&input);
    args.levels = vec!["Field_of_Study".into()];
    args.value = Some("Age".into());
    args.color = Some(ColorColumns::new("Networking_Score", "Soft_Skills_Score"));

    let tree = run_tree(&args, &mut Vec::new()).unwrap();
    assert_eq!(tree.len(), 3);
    assert!(tree.nodes()[..2].iter().all(|n| n.parent == ROOT_ID));

    let arts = tree.find(&["Arts"]).unwrap();
    assert_eq!(arts.value, 24.0 + 27.0 + 29.0);
    assert!(approx(arts.color, 8.0 / 19.0));
}

#[test]
fn test_filters_narrow_the_records() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let mut args = tree_args(&input);
    args.filter = FilterArgs {
        filters: vec![drilldown_lib::cli::parse_value_filter("Gender=Female|Other").unwrap()],
        ranges: vec![RecordFilter::range("Age", Some(28.0), None)],
    };

    let tree = run_tree(&args, &mut Vec::new()).unwrap();
    let root = tree.root().unwrap();
    assert_eq!(root.value, 9.0);
    assert!(tree.find(&["Male"]).is_none());
}

#[test]
fn test_filter_removing_everything_is_empty_input() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let mut args = tree_args(&input);
    args.filter.ranges = vec![RecordFilter::range("Age", Some(90.0), None)];

    let err = run_tree(&args, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, AppError::Rollup(RollupError::EmptyInput)));
}

#[test]
fn test_missing_column_reported() {
    let fixture = EducationFixture::new();
    let input = fixture.write_csv();

    let mut args = tree_args(&input);
    args.color = Some(ColorColumns::new("Soft_Skills_Score", "Mentoring_Score"));

    let err = run_tree(&args, &mut Vec::new()).unwrap_err();
    match err {
        AppError::Rollup(RollupError::MissingColumn(name)) => assert_eq!(name, "Mentoring_Score"),
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// INPUT AND OUTPUT FORMATS
// ============================================================================

#[test]
fn test_xlsx_input_matches_csv_input() {
    let fixture = EducationFixture::new();
    let csv_tree = run_tree(&tree_args(&fixture.write_csv()), &mut Vec::new()).unwrap();

    let mut args = tree_args(&fixture.write_xlsx());
    args.source.sheet = Some(SHEET_NAME.to_string());
    let xlsx_tree = run_tree(&args, &mut Vec::new()).unwrap();

    assert_eq!(csv_tree, xlsx_tree);
}

#[test]
fn test_unknown_sheet() {
    let fixture = EducationFixture::new();
    let mut args = tree_args(&fixture.write_xlsx());
    args.source.sheet = Some("Sheet9".to_string());

    let err = run_tree(&args, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, AppError::Persistence(PersistenceError::SheetNotFound(_))));
}

#[test]
fn test_xlsx_output_file() {
    let fixture = EducationFixture::new();
    let mut args = tree_args(&fixture.write_csv());
    let output = fixture.path("tree.xlsx");
    args.output = OutputArgs {
        output: Some(output.clone()),
        format: None,
    };

    let mut out = Vec::new();
    run_tree(&args, &mut out).unwrap();
    assert!(out.is_empty());

    let saved = load_table(&output, Some(TREE_SHEET_NAME)).unwrap();
    assert_eq!(saved.headers(), ["id", "parent", "value", "color"]);
    assert_eq!(saved.row_count(), 14);
}

#[test]
fn test_json_to_stdout() {
    let fixture = EducationFixture::new();
    let mut args = tree_args(&fixture.write_csv());
    args.output.format = Some(OutputFormat::Json);

    let mut out = Vec::new();
    run_tree(&args, &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["ids"][0], "total/Female/Arts/Entry");
    assert_eq!(json["labels"][0], "Entry");
    assert_eq!(json["parents"][0], "total/Female/Arts");
    assert_eq!(json["ids"][1], "total/Male/Arts/Entry");
    assert!(json["colors"][3].is_null());
    assert_eq!(json["colors"][4], 4.0);
    assert_eq!(json["ids"][13], "total");
}

#[test]
fn test_xlsx_to_stdout_rejected() {
    let fixture = EducationFixture::new();
    let mut args = tree_args(&fixture.write_csv());
    args.output.format = Some(OutputFormat::Xlsx);

    let err = run_tree(&args, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, AppError::Persistence(PersistenceError::InvalidFormat(_))));
}
