use crate::core::export;
use crate::core::ingest;
use crate::core::transform::{StepOutcome, TransformPlan, TransformStep};
use crate::core::visualize::{chart_series, render_preview, ChartRenderer, TextBarChart};
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{ConversionRequest, SavedDownload, SourceFormat, Table, UploadedFile};
use crate::utils::error::Result;
use std::path::Path;

/// Per-file ingest → clean → select → convert → export flow.
pub struct SweepPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) chart: TextBarChart,
}

impl<S: Storage, C: ConfigProvider> SweepPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            chart: TextBarChart::default(),
        }
    }
}

/// Human-readable description of what would happen to `path`, without reading it.
pub fn describe_plan<C: ConfigProvider>(path: &str, config: &C) -> Result<String> {
    let file_name = upload_name(path);
    let format = SourceFormat::from_file_name(&file_name)?;
    let options = config.options_for(&file_name);
    let request = ConversionRequest::for_file(&file_name, options.format);

    let mut lines = vec![format!("{} ({})", file_name, format.extension())];
    for step in TransformPlan::from_options(&options).steps() {
        lines.push(match step {
            TransformStep::RemoveDuplicates => "  - remove duplicate rows".to_string(),
            TransformStep::FillMissing => "  - fill missing numeric values with column mean".to_string(),
            TransformStep::SelectColumns(columns) if columns.is_empty() => {
                "  - keep no columns".to_string()
            }
            TransformStep::SelectColumns(columns) => {
                format!("  - keep columns: {}", columns.join(", "))
            }
        });
    }
    if options.chart {
        lines.push("  - chart first two numeric columns".to_string());
    }
    lines.push(format!(
        "  -> {} as {} ({})",
        request.file_name,
        options.format.label(),
        request.mime_type
    ));

    Ok(lines.join("\n"))
}

fn upload_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SweepPipeline<S, C> {
    async fn receive(&self, path: &str) -> Result<UploadedFile> {
        let name = upload_name(path);

        // 先檢查副檔名，不支援的檔案不讀取內容
        SourceFormat::from_file_name(&name)?;

        tracing::debug!("Reading upload from: {}", path);
        let bytes = self.storage.read_file(path).await?;
        Ok(UploadedFile::new(name, bytes))
    }

    async fn extract(&self, file: &UploadedFile) -> Result<Table> {
        println!("**File Name:** {}", file.name);
        println!("**File Size:** {:.2} KB", file.size_kb());
        println!("**File Format:** {}", file.extension());

        let table = ingest::load(file, &self.config.ingest_options())?;

        println!("## Data Preview");
        print!("{}", render_preview(&table, self.config.preview_rows()));

        tracing::info!(
            "📥 Loaded {}: {} rows, {} columns",
            file.name,
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }

    async fn transform(&self, file: &UploadedFile, table: Table) -> Result<Table> {
        let options = self.config.options_for(&file.name);
        let plan = TransformPlan::from_options(&options);

        if plan.is_empty() {
            tracing::debug!("No transformations requested for {}", file.name);
        }

        let (table, outcomes) = plan.apply(table)?;

        for outcome in &outcomes {
            match outcome {
                StepOutcome::DuplicatesRemoved(count) => {
                    println!("✅ Duplicates removed successfully! ({} rows dropped)", count);
                }
                StepOutcome::MissingFilled(summary) => {
                    println!(
                        "✅ Missing values filled successfully! ({} cells)",
                        summary.cells_filled()
                    );
                    for column in &summary.skipped_all_missing {
                        tracing::warn!(
                            "⚠️ {}: column '{}' has no values to average",
                            file.name,
                            column
                        );
                    }
                }
                StepOutcome::ColumnsSelected(count) => {
                    tracing::info!("🔄 {}: kept {} columns", file.name, count);
                }
            }
        }

        if outcomes
            .iter()
            .any(|o| !matches!(o, StepOutcome::ColumnsSelected(_)))
        {
            print!("{}", render_preview(&table, self.config.preview_rows()));
        }

        // 圖表使用投影後的欄位
        if options.chart {
            println!("## Data Visualization");
            match self.chart.render_bar_chart(&chart_series(&table)) {
                Some(chart) => print!("{}", chart),
                None => println!("(no numeric columns to chart)"),
            }
        }

        Ok(table)
    }

    fn download_name(&self, file: &UploadedFile) -> String {
        let options = self.config.options_for(&file.name);
        ConversionRequest::for_file(&file.name, options.format).file_name
    }

    async fn load(&self, file: &UploadedFile, table: &Table) -> Result<SavedDownload> {
        let options = self.config.options_for(&file.name);
        let request = ConversionRequest::for_file(&file.name, options.format);

        let download = export::export(table, &request)?;

        tracing::debug!(
            "Writing {} ({} bytes) to storage",
            download.file_name,
            download.bytes.len()
        );
        let location = self
            .storage
            .write_file(&download.file_name, &download.bytes)
            .await?;

        println!(
            "✅ {} converted to {} successfully!",
            file.name,
            options.format.label()
        );
        println!(
            "⬇ {} saved to {} ({})",
            download.file_name, location, download.mime_type
        );

        Ok(SavedDownload {
            file_name: download.file_name,
            mime_type: download.mime_type,
            location,
            size: download.bytes.len(),
        })
    }
}
