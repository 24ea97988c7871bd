use std::fmt;

/// The per-file stages the engine samples after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ingest,
    Transform,
    Export,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Ingest => "ingest",
            Phase::Transform => "transform",
            Phase::Export => "export",
        })
    }
}

#[cfg(feature = "cli")]
pub use enabled::SystemMonitor;

#[cfg(not(feature = "cli"))]
pub use disabled::SystemMonitor;

#[cfg(feature = "cli")]
mod enabled {
    use super::Phase;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    /// Resident memory and CPU of this process after one phase of one file.
    #[derive(Debug, Clone)]
    pub struct PhaseSample {
        pub file_name: String,
        pub phase: Phase,
        pub memory_mb: u64,
        pub cpu_usage: f32,
        pub elapsed: Duration,
    }

    #[derive(Debug, Default)]
    struct Samples {
        taken: usize,
        peak_memory_mb: u64,
        peak_file: Option<String>,
    }

    /// Tables live fully in memory, so the interesting number is how far
    /// resident memory climbs while a large upload is decoded.
    pub struct SystemMonitor {
        system: Mutex<System>,
        pid: Option<Pid>,
        started: Instant,
        samples: Mutex<Samples>,
        enabled: bool,
    }

    impl SystemMonitor {
        pub fn new(enabled: bool) -> Self {
            let pid = if enabled {
                sysinfo::get_current_pid().ok()
            } else {
                None
            };

            Self {
                system: Mutex::new(System::new()),
                pid,
                started: Instant::now(),
                samples: Mutex::new(Samples::default()),
                enabled,
            }
        }

        pub fn is_enabled(&self) -> bool {
            self.enabled
        }

        /// Refreshes only this process and records it against `file_name`.
        pub fn sample(&self, file_name: &str, phase: Phase) -> Option<PhaseSample> {
            let pid = self.pid?;

            let mut system = self.system.lock().ok()?;
            system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory().with_cpu(),
            );
            let process = system.process(pid)?;

            let sample = PhaseSample {
                file_name: file_name.to_string(),
                phase,
                memory_mb: process.memory() / 1024 / 1024,
                cpu_usage: process.cpu_usage(),
                elapsed: self.started.elapsed(),
            };

            let mut samples = self.samples.lock().ok()?;
            samples.taken += 1;
            if sample.memory_mb >= samples.peak_memory_mb {
                samples.peak_memory_mb = sample.memory_mb;
                samples.peak_file = Some(file_name.to_string());
            }

            Some(sample)
        }

        pub fn log_phase(&self, file_name: &str, phase: Phase) {
            if let Some(sample) = self.sample(file_name, phase) {
                tracing::info!(
                    file = %sample.file_name,
                    phase = %sample.phase,
                    memory_mb = sample.memory_mb,
                    cpu = sample.cpu_usage,
                    "📊 {} {} - CPU: {:.1}%, Memory: {}MB, Time: {:?}",
                    sample.file_name,
                    sample.phase,
                    sample.cpu_usage,
                    sample.memory_mb,
                    sample.elapsed
                );
            }
        }

        pub fn log_summary(&self) {
            if !self.enabled {
                return;
            }
            let Ok(samples) = self.samples.lock() else {
                return;
            };
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB ({}), Samples: {}",
                self.started.elapsed(),
                samples.peak_memory_mb,
                samples.peak_file.as_deref().unwrap_or("-"),
                samples.taken
            );
        }
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
mod disabled {
    use super::Phase;

    #[derive(Debug, Default)]
    pub struct SystemMonitor;

    impl SystemMonitor {
        pub fn new(_enabled: bool) -> Self {
            Self
        }

        pub fn is_enabled(&self) -> bool {
            false
        }

        pub fn log_phase(&self, _file_name: &str, _phase: Phase) {}

        pub fn log_summary(&self) {}
    }
}
