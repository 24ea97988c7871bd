use data_sweeper::core::engine::FileOutcome;
use data_sweeper::core::{export::export, ingest::read_csv};
use data_sweeper::domain::model::{ConversionRequest, TargetFormat};
use data_sweeper::domain::ports::IngestOptions;
use data_sweeper::utils::error::{ErrorCategory, ErrorSeverity};
use data_sweeper::{LocalStorage, SweepConfig, SweepEngine, SweepPipeline};
use std::path::Path;
use tempfile::TempDir;

fn write_input(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_end_to_end_sweep_writes_cleaned_csv() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_string_lossy().into_owned();

    let orders = write_input(
        input_dir.path(),
        "orders.csv",
        "id,customer,amount\n1,Ada,10\n2,Bob,\n1,Ada,10\n3,Cy,20\n",
    );

    let config = SweepConfig::from_toml_str(&format!(
        r#"
[output]
path = "{}"

[cleaning]
remove_duplicates = true
fill_missing = true
"#,
        output_path.replace('\\', "\\\\")
    ))
    .unwrap();

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = SweepPipeline::new(storage, config);
    let engine = SweepEngine::new_with_monitoring(pipeline, false);

    let report = engine.run(&[orders]).await;

    assert_eq!(report.converted_count(), 1);
    assert_eq!(report.worst_severity(), None);

    match &report.outcomes[0] {
        FileOutcome::Converted {
            rows,
            columns,
            download,
            ..
        } => {
            assert_eq!(*rows, 3);
            assert_eq!(*columns, 3);
            assert_eq!(download.file_name, "orders.csv");
            assert_eq!(download.mime_type, "text/csv");
        }
        other => panic!("expected conversion, got {:?}", other),
    }

    let written = std::fs::read_to_string(output_dir.path().join("orders.csv")).unwrap();
    assert_eq!(written, "id,customer,amount\n1,Ada,10\n2,Bob,15\n3,Cy,20\n");
}

#[tokio::test]
async fn test_unsupported_upload_is_skipped_and_batch_continues() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_string_lossy().into_owned();

    let notes = write_input(input_dir.path(), "notes.TXT", "a,b\n1,2\n");
    let data = write_input(input_dir.path(), "data.csv", "a,b\n1,2\n");

    let storage = LocalStorage::new(output_path);
    let pipeline = SweepPipeline::new(storage, SweepConfig::default());
    let report = SweepEngine::new(pipeline).run(&[notes, data]).await;

    assert_eq!(report.outcomes.len(), 2);
    match &report.outcomes[0] {
        FileOutcome::Failed {
            category,
            severity,
            message,
            ..
        } => {
            assert_eq!(*category, ErrorCategory::Input);
            assert_eq!(*severity, ErrorSeverity::Low);
            assert!(message.contains("notes.TXT"));
            assert!(message.contains(".txt"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.outcomes[1].is_converted());

    assert!(!output_dir.path().join("notes.csv").exists());
    assert!(output_dir.path().join("data.csv").exists());
}

#[tokio::test]
async fn test_empty_selection_exports_empty_csv() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_string_lossy().into_owned();

    let data = write_input(input_dir.path(), "wide.csv", "a,b,c\n1,2,3\n4,5,6\n");

    let config = SweepConfig::from_toml_str("[selection]\ncolumns = []\n").unwrap();
    let storage = LocalStorage::new(output_path);
    let report = SweepEngine::new(SweepPipeline::new(storage, config))
        .run(&[data])
        .await;

    match &report.outcomes[0] {
        FileOutcome::Converted { rows, columns, .. } => {
            assert_eq!(*rows, 0);
            assert_eq!(*columns, 0);
        }
        other => panic!("expected conversion, got {:?}", other),
    }

    let written = std::fs::read(output_dir.path().join("wide.csv")).unwrap();
    assert_eq!(written, b"\n".to_vec());
}

#[tokio::test]
async fn test_csv_and_xlsx_with_same_stem_keep_first_download() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let csv = write_input(input_dir.path(), "a.csv", "n\n1\n");
    let table = read_csv("a.xlsx", b"n\n2\n", &IngestOptions::default()).unwrap();
    let workbook = export(&table, &ConversionRequest::for_file("a.xlsx", TargetFormat::Xlsx)).unwrap();
    let xlsx = input_dir.path().join("a.xlsx");
    std::fs::write(&xlsx, workbook.bytes).unwrap();

    let storage = LocalStorage::new(output_dir.path().to_string_lossy().into_owned());
    let report = SweepEngine::new(SweepPipeline::new(storage, SweepConfig::default()))
        .run(&[csv, xlsx.to_string_lossy().into_owned()])
        .await;

    assert!(report.outcomes[0].is_converted());
    assert!(!report.outcomes[1].is_converted());
    assert_eq!(report.worst_severity(), Some(ErrorSeverity::Medium));

    let written = std::fs::read_to_string(output_dir.path().join("a.csv")).unwrap();
    assert_eq!(written, "n\n1\n");
}

#[tokio::test]
async fn test_missing_input_file_is_critical() {
    let output_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(output_dir.path().to_string_lossy().into_owned());
    let pipeline = SweepPipeline::new(storage, SweepConfig::default());

    let report = SweepEngine::new(pipeline)
        .run(&["/no/such/dir/input.csv".to_string()])
        .await;

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.worst_severity(), Some(ErrorSeverity::Critical));
}

#[tokio::test]
async fn test_ragged_csv_reports_line_and_counts() {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let broken = write_input(input_dir.path(), "broken.csv", "a,b\n1,2\n3,4,5\n");
    let storage = LocalStorage::new(output_dir.path().to_string_lossy().into_owned());
    let report = SweepEngine::new(SweepPipeline::new(storage, SweepConfig::default()))
        .run(&[broken])
        .await;

    match &report.outcomes[0] {
        FileOutcome::Failed {
            category, message, ..
        } => {
            assert_eq!(*category, ErrorCategory::Data);
            assert!(message.contains("expected 2 fields in line 3, saw 3"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!output_dir.path().join("broken.csv").exists());
}
