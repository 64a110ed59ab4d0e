use cohortlens::config::{AnalysisConfig, PrevalenceConfig};
use cohortlens::prevalence::counter::{BiomarkerSummary, scan_path};
use cohortlens::prevalence::{PrevalenceError, run_prevalence};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn survey_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{content}").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reference_scenario_from_a_file() {
    let file = survey_file("DIQ010,LBXGH\n1,7.0\n,5.0\n0,6.6\n");
    let report = run_prevalence(file.path(), &PrevalenceConfig::default()).unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.diagnosed, Some(1));
    assert_eq!(
        report.biomarker,
        Some(BiomarkerSummary {
            positive: 2,
            missing: 0,
            undiagnosed: 1,
        })
    );
}

#[test]
fn absent_biomarker_column_still_counts_rows_and_diagnoses() {
    let file = survey_file("SEQN,DIQ010,BMXBMI\n1,1,31.0\n2,2,22.4\n3,1,27.9\n4,,25.0\n");
    let report = scan_path(file.path(), &PrevalenceConfig::default()).unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.diagnosed, Some(2));
    assert!(report.biomarker.is_none());

    let text = report.to_string();
    assert!(text.contains("LBXGH column not found in CSV header"));
    assert!(!text.contains("Inferred undiagnosed"));
}

#[test]
fn configured_columns_and_cutoff_are_honoured() {
    let file = survey_file("self_dx,a1c\nno,6.6\nyes,7.5\nno,7.1\n");
    let config = PrevalenceConfig {
        self_report_column: "SELF_DX".to_string(),
        biomarker_column: "A1C".to_string(),
        biomarker_cutoff: 7.0,
        ..PrevalenceConfig::default()
    };
    let report = scan_path(file.path(), &config).unwrap();
    assert_eq!(report.diagnosed, Some(1));
    let summary = report.biomarker.unwrap();
    assert_eq!(summary.positive, 2);
    assert_eq!(summary.undiagnosed, 1);
    assert!(
        report
            .to_string()
            .contains("Inferred undiagnosed (HbA1c>=7.0 and SELF_DX!=1): 1")
    );
}

#[test]
fn blank_lines_are_counted_as_empty_rows() {
    let file = survey_file("DIQ010,LBXGH\n1,7.0\n\n0,6.6\n");
    let report = scan_path(file.path(), &PrevalenceConfig::default()).unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.diagnosed, Some(1));
    let summary = report.biomarker.unwrap();
    assert_eq!(summary.positive, 2);
    assert_eq!(summary.missing, 0);
    assert!(report.to_string().contains("Rows scanned: 3"));
}

#[test]
fn scanning_twice_gives_identical_reports() {
    let file = survey_file("DIQ010,LBXGH\n1,7.0\n2,abc\n2,8.8\n,\n3\n");
    let config = PrevalenceConfig::default();
    let first = scan_path(file.path(), &config).unwrap();
    let second = scan_path(file.path(), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_file_is_reported_by_path() {
    let err = scan_path(
        Path::new("missing/Cleaning_data_cleaned.csv"),
        &AnalysisConfig::default().prevalence,
    )
    .unwrap_err();
    match err {
        PrevalenceError::InputNotFound(path) => {
            assert_eq!(path, Path::new("missing/Cleaning_data_cleaned.csv"))
        }
        other => panic!("Expected InputNotFound, got {other:?}"),
    }
}

#[test]
fn invalid_utf8_is_a_csv_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"DIQ010,LBXGH\n1,\xff\xfe\n").unwrap();
    file.flush().unwrap();
    let err = scan_path(file.path(), &PrevalenceConfig::default()).unwrap_err();
    assert!(matches!(err, PrevalenceError::Csv(_)));
}
