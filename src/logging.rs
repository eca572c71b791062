// Copyright (C) Brian G. Milnes 2025

//! Run logs for chainfix tools
//!
//! Each run writes `logs/<tool-name>/<YYYY-MM-DD>/run-<HH-MM-SS>.log`,
//! mirroring what it prints. Per-site detail that would swamp the terminal
//! goes to the log only.

pub mod logging {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use chrono::{DateTime, Local};
    use anyhow::Result;

    pub struct ToolLogger {
        log_file: Option<fs::File>,
        log_path: Option<PathBuf>,
        tool_name: String,
        start_time: DateTime<Local>,
    }

    impl ToolLogger {
        /// Logger that only prints
        pub fn new_disabled() -> Self {
            ToolLogger {
                log_file: None,
                log_path: None,
                tool_name: String::new(),
                start_time: Local::now(),
            }
        }

        /// Logger writing under `./logs`
        pub fn new(tool_name: &str) -> Self {
            Self::in_dir(Path::new("logs"), tool_name)
        }

        /// Logger writing under `base`; falls back to printing only if the file cannot be created
        pub fn in_dir(base: &Path, tool_name: &str) -> Self {
            let start_time = Local::now();
            let (log_file, log_path) = match Self::create_log_file(base, tool_name, &start_time) {
                Ok((file, path)) => (Some(file), Some(path)),
                Err(e) => {
                    eprintln!("Warning: Could not create log file: {e}");
                    eprintln!("Continuing without logging...");
                    (None, None)
                }
            };

            ToolLogger {
                log_file,
                log_path,
                tool_name: tool_name.to_string(),
                start_time,
            }
        }

        fn create_log_file(base: &Path, tool_name: &str, start_time: &DateTime<Local>) -> Result<(fs::File, PathBuf)> {
            let log_dir = base
                .join(tool_name)
                .join(start_time.format("%Y-%m-%d").to_string());
            fs::create_dir_all(&log_dir)?;

            let log_path = log_dir.join(format!("run-{}.log", start_time.format("%H-%M-%S")));
            let log_file = fs::File::create(&log_path)?;
            Ok((log_file, log_path))
        }

        /// Print and log
        pub fn log(&mut self, message: &str) {
            println!("{message}");
            self.log_silent(message);
        }

        /// Log file only
        pub fn log_silent(&mut self, message: &str) {
            if let Some(ref mut file) = self.log_file {
                let _ = writeln!(file, "{message}");
            }
        }

        pub fn log_path(&self) -> Option<&Path> {
            self.log_path.as_deref()
        }

        pub fn finalize(&mut self, summary: &str) {
            let end_time = Local::now();
            let duration = end_time.signed_duration_since(self.start_time);

            self.log_silent("");
            self.log_silent("=== Run Summary ===");
            self.log_silent(&format!("Tool: {}", self.tool_name));
            self.log_silent(summary);
            self.log_silent(&format!("Started: {}", self.start_time.format("%Y-%m-%d %H:%M:%S")));
            self.log_silent(&format!("Ended: {}", end_time.format("%Y-%m-%d %H:%M:%S")));
            self.log_silent(&format!("Duration: {}ms", duration.num_milliseconds()));

            if let Some(path) = self.log_path.clone() {
                self.log(&format!("Log saved to: {}", path.display()));
            }
        }
    }

    impl Drop for ToolLogger {
        fn drop(&mut self) {
            if let Some(ref mut file) = self.log_file {
                let _ = file.flush();
            }
        }
    }
}
