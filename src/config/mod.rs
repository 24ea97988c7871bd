pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::toml_config::SweepConfig;
    use crate::domain::model::TargetFormat;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_unique_names, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "data-sweeper")]
    #[command(about = "Clean CSV and Excel files and convert them between formats")]
    pub struct CliConfig {
        /// Files to process (.csv or .xlsx)
        #[arg(required = true)]
        pub files: Vec<String>,

        /// Directory that receives the converted files
        #[arg(long)]
        pub output_path: Option<String>,

        /// Target format for every file
        #[arg(long = "to", value_enum)]
        pub format: Option<TargetFormat>,

        #[arg(long, help = "Remove rows that duplicate an earlier row")]
        pub remove_duplicates: bool,

        #[arg(long, help = "Fill missing numeric values with the column mean")]
        pub fill_missing: bool,

        /// Columns to keep, in output order
        #[arg(long, value_delimiter = ',')]
        pub columns: Vec<String>,

        #[arg(long, help = "Draw a bar chart of the first two numeric columns")]
        pub chart: bool,

        /// Rows shown in the data preview
        #[arg(long)]
        pub preview_rows: Option<usize>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Write a JSON summary of every file to this path
        #[arg(long)]
        pub report: Option<String>,

        /// Show what would be processed without writing anything
        #[arg(long)]
        pub dry_run: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[arg(long, help = "Log memory and CPU usage per phase")]
        pub monitor: bool,
    }

    impl CliConfig {
        /// Loads the TOML file when given, then lets command-line flags win.
        pub fn load_settings(&self) -> Result<SweepConfig> {
            let mut settings = match &self.config {
                Some(path) => SweepConfig::from_file(path)?,
                None => SweepConfig::default(),
            };

            // 應用命令列覆蓋設定
            if let Some(path) = &self.output_path {
                settings.output.path = path.clone();
            }
            if let Some(format) = self.format {
                settings.output.format = format;
            }
            if self.remove_duplicates {
                settings.cleaning.remove_duplicates = true;
            }
            if self.fill_missing {
                settings.cleaning.fill_missing = true;
            }
            if !self.columns.is_empty() {
                settings.selection.columns = Some(self.columns.clone());
            }
            if self.chart {
                settings.preview.chart = true;
            }
            if let Some(rows) = self.preview_rows {
                settings.preview.rows = rows;
            }
            if self.monitor {
                settings.monitoring.enabled = true;
            }

            Ok(settings)
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_unique_names("columns", &self.columns)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::ConfigProvider;
        use std::io::Write;
        use tempfile::NamedTempFile;

        #[test]
        fn test_parse_flags() {
            let cli = CliConfig::parse_from([
                "data-sweeper",
                "a.csv",
                "b.xlsx",
                "--to",
                "excel",
                "--columns",
                "id,total",
                "--fill-missing",
            ]);

            assert_eq!(cli.files, vec!["a.csv", "b.xlsx"]);
            assert_eq!(cli.format, Some(TargetFormat::Xlsx));
            assert_eq!(cli.columns, vec!["id", "total"]);
            assert!(cli.fill_missing);
            assert!(!cli.remove_duplicates);
        }

        #[test]
        fn test_flags_override_toml() {
            let mut temp_file = NamedTempFile::new().unwrap();
            temp_file
                .write_all(b"[output]\npath = \"./toml-out\"\nformat = \"xlsx\"\n[preview]\nrows = 3\n")
                .unwrap();
            let config_path = temp_file.path().to_string_lossy().into_owned();

            let cli = CliConfig::parse_from([
                "data-sweeper",
                "a.csv",
                "--config",
                config_path.as_str(),
                "--to",
                "csv",
                "--remove-duplicates",
            ]);
            let settings = cli.load_settings().unwrap();

            assert_eq!(settings.output_path(), "./toml-out");
            assert_eq!(settings.preview_rows(), 3);

            let options = settings.options_for("a.csv");
            assert_eq!(options.format, TargetFormat::Csv);
            assert!(options.remove_duplicates);
        }

        #[test]
        fn test_repeated_columns_fail_validation() {
            let cli = CliConfig::parse_from(["data-sweeper", "a.csv", "--columns", "x,x"]);
            assert!(cli.validate().is_err());
        }
    }
}
