use crate::core::ConfigProvider;
use crate::domain::model::TargetFormat;
use crate::domain::ports::{FileOptions, IngestOptions};
use crate::utils::error::{Result, SweepError};
use crate::utils::validation::{
    validate_file_extensions, validate_path, validate_positive_number, validate_unique_names,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_OUTPUT_PATH: &str = "./converted";
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub output: OutputConfig,
    pub cleaning: CleaningConfig,
    pub selection: SelectionConfig,
    pub ingest: IngestConfig,
    pub preview: PreviewConfig,
    pub monitoring: MonitoringConfig,
    /// Per-file overrides keyed by the uploaded file name.
    pub files: BTreeMap<String, FileOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: TargetFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT_PATH.to_string(),
            format: TargetFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Absent means every column in its original order.
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub missing_markers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub rows: usize,
    pub chart: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_PREVIEW_ROWS,
            chart: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOverride {
    pub columns: Option<Vec<String>>,
    pub format: Option<TargetFormat>,
    pub remove_duplicates: Option<bool>,
    pub fill_missing: Option<bool>,
    pub chart: Option<bool>,
}

impl SweepConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SweepError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SweepError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OUTPUT_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;

        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SweepError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_path("output.path", &self.output.path)?;
        validate_positive_number("preview.rows", self.preview.rows, 1)?;

        if let Some(columns) = &self.selection.columns {
            validate_unique_names("selection.columns", columns)?;
        }

        let file_names: Vec<String> = self.files.keys().cloned().collect();
        validate_file_extensions("files", &file_names, &["csv", "xlsx"])?;

        for (name, file) in &self.files {
            if let Some(columns) = &file.columns {
                validate_unique_names(&format!("files.\"{}\".columns", name), columns)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    fn file_override(&self, file_name: &str) -> Option<&FileOverride> {
        self.files.get(file_name).or_else(|| {
            self.files
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(file_name))
                .map(|(_, file)| file)
        })
    }
}

impl ConfigProvider for SweepConfig {
    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn preview_rows(&self) -> usize {
        self.preview.rows
    }

    fn ingest_options(&self) -> IngestOptions {
        match &self.ingest.missing_markers {
            Some(markers) => IngestOptions {
                missing_markers: markers.clone(),
            },
            None => IngestOptions::default(),
        }
    }

    fn options_for(&self, file_name: &str) -> FileOptions {
        let mut options = FileOptions {
            remove_duplicates: self.cleaning.remove_duplicates,
            fill_missing: self.cleaning.fill_missing,
            columns: self.selection.columns.clone(),
            chart: self.preview.chart,
            format: self.output.format,
        };

        if let Some(file) = self.file_override(file_name) {
            if let Some(columns) = &file.columns {
                options.columns = Some(columns.clone());
            }
            if let Some(format) = file.format {
                options.format = format;
            }
            if let Some(remove_duplicates) = file.remove_duplicates {
                options.remove_duplicates = remove_duplicates;
            }
            if let Some(fill_missing) = file.fill_missing {
                options.fill_missing = fill_missing;
            }
            if let Some(chart) = file.chart {
                options.chart = chart;
            }
        }

        options
    }
}

impl Validate for SweepConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
