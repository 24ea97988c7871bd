use crate::core::xlsx;
use crate::domain::model::{ConversionRequest, Download, Table, TargetFormat};
use crate::utils::error::{Result, SweepError};

/// Re-encodes `table` for download. No row index column is written.
pub fn export(table: &Table, request: &ConversionRequest) -> Result<Download> {
    let bytes = match request.format {
        TargetFormat::Csv => write_csv(table)?,
        TargetFormat::Xlsx => xlsx::write_workbook(table)?,
    };

    tracing::debug!(
        "Encoded {} rows x {} columns as {} ({} bytes)",
        table.row_count(),
        table.column_count(),
        request.format.label(),
        bytes.len()
    );

    Ok(Download {
        file_name: request.file_name.clone(),
        mime_type: request.mime_type.clone(),
        bytes,
    })
}

pub fn write_csv(table: &Table) -> Result<Vec<u8>> {
    // 沒有欄位時只輸出空白標題列
    if table.column_count() == 0 {
        return Ok(b"\n".to_vec());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        writer.write_record(table.columns().iter().map(|c| c.values[row].to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| SweepError::IoError(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::read_csv;
    use crate::core::transform::select_columns;
    use crate::domain::model::{CSV_MIME_TYPE, XLSX_MIME_TYPE};
    use crate::domain::ports::IngestOptions;

    fn table(csv: &str) -> Table {
        read_csv("in.csv", csv.as_bytes(), &IngestOptions::default()).unwrap()
    }

    #[test]
    fn test_export_csv() {
        let t = table("name,score,ok\nAda,1.5,true\n\"Smith, J\",,false\n");
        let request = ConversionRequest::for_file("in.csv", TargetFormat::Csv);
        let download = export(&t, &request).unwrap();

        assert_eq!(download.file_name, "in.csv");
        assert_eq!(download.mime_type, CSV_MIME_TYPE);
        assert_eq!(
            String::from_utf8(download.bytes).unwrap(),
            "name,score,ok\nAda,1.5,true\n\"Smith, J\",,false\n"
        );
    }

    #[test]
    fn test_csv_round_trip_is_byte_identical() {
        let input = "id,city,amount\n1,Oslo,10.5\n2,Lima,\n3,,7\n";
        let output = write_csv(&table(input)).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), input);
    }

    #[test]
    fn test_zero_column_export_is_empty_header_line() {
        let t = select_columns(&table("a,b\n1,2\n"), &[]).unwrap();
        let request = ConversionRequest::for_file("in.csv", TargetFormat::Csv);
        let download = export(&t, &request).unwrap();

        assert_eq!(download.bytes, b"\n".to_vec());
    }

    #[test]
    fn test_zero_row_export_keeps_header() {
        let t = table("a,b\n");
        assert_eq!(write_csv(&t).unwrap(), b"a,b\n".to_vec());
    }

    #[test]
    fn test_export_xlsx_metadata() {
        let t = table("a\n1\n");
        let request = ConversionRequest::for_file("in.csv", TargetFormat::Xlsx);
        let download = export(&t, &request).unwrap();

        assert_eq!(download.file_name, "in.xlsx");
        assert_eq!(download.mime_type, XLSX_MIME_TYPE);
        // zip 檔頭
        assert_eq!(&download.bytes[..2], b"PK");
    }
}
