use crate::core::Pipeline;
use crate::domain::model::SavedDownload;
use crate::utils::error::{ErrorCategory, ErrorSeverity, Result, SweepError};
use crate::utils::monitor::{Phase, SystemMonitor};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Converted {
        source: String,
        rows: usize,
        columns: usize,
        download: SavedDownload,
    },
    Failed {
        source: String,
        category: ErrorCategory,
        severity: ErrorSeverity,
        message: String,
    },
}

impl FileOutcome {
    pub fn source(&self) -> &str {
        match self {
            FileOutcome::Converted { source, .. } | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

/// Result of one run over a batch of uploads, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub outcomes: Vec<FileOutcome>,
}

impl SweepReport {
    pub fn converted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_converted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.converted_count()
    }

    pub fn worst_severity(&self) -> Option<ErrorSeverity> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { severity, .. } => Some(*severity),
                FileOutcome::Converted { .. } => None,
            })
            .max()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct SweepEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SweepEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Processes every file in order. A failing file is recorded and skipped;
    /// it never stops the files after it.
    ///
    /// A download name is claimed by the first file that writes it. A later file
    /// mapping to the same name fails instead of overwriting that download.
    pub async fn run(&self, paths: &[String]) -> SweepReport {
        let mut report = SweepReport::default();
        let mut claimed: HashMap<String, String> = HashMap::new();

        for path in paths {
            let outcome = match self.process(path, &mut claimed).await {
                Ok((rows, columns, download)) => FileOutcome::Converted {
                    source: path.clone(),
                    rows,
                    columns,
                    download,
                },
                Err(e) => {
                    tracing::error!(
                        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                        path,
                        e,
                        e.category(),
                        e.severity()
                    );
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                    let message = format!("{}: {}", path, e.user_friendly_message());
                    eprintln!("❌ {}", message);

                    FileOutcome::Failed {
                        source: path.clone(),
                        category: e.category(),
                        severity: e.severity(),
                        message,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        self.monitor.log_summary();
        tracing::info!(
            "🏁 Processed {} files: {} converted, {} failed",
            report.outcomes.len(),
            report.converted_count(),
            report.failed_count()
        );
        report
    }

    async fn process(
        &self,
        path: &str,
        claimed: &mut HashMap<String, String>,
    ) -> Result<(usize, usize, SavedDownload)> {
        tracing::info!("🚀 Processing {}", path);

        let file = self.pipeline.receive(path).await?;
        let table = self.pipeline.extract(&file).await?;
        self.monitor.log_phase(&file.name, Phase::Ingest);

        let table = self.pipeline.transform(&file, table).await?;
        self.monitor.log_phase(&file.name, Phase::Transform);

        // 大小寫不同的檔名在部分檔案系統上是同一個檔案
        let file_name = self.pipeline.download_name(&file);
        let key = file_name.to_lowercase();
        if let Some(first) = claimed.get(&key) {
            return Err(SweepError::DownloadConflict {
                file_name,
                first_source: first.clone(),
            });
        }

        let download = self.pipeline.load(&file, &table).await?;
        claimed.insert(key, path.to_string());
        self.monitor.log_phase(&file.name, Phase::Export);

        Ok((table.row_count(), table.column_count(), download))
    }
}
