// Copyright (C) Brian G. Milnes 2025

//! Shared wrapper for chainfix binaries
//!
//! Prints the directory context Emacs compile-mode expects, times the run
//! and owns the optional run log.

pub mod tool_runner {
    use std::time::Instant;
    use std::path::PathBuf;
    use anyhow::Result;
    use crate::logging::logging::ToolLogger;

    pub struct ToolConfig {
        /// Log directory name
        pub tool_name: String,
        /// Shown in "Entering directory"
        pub base_dir: PathBuf,
        pub enable_logging: bool,
    }

    impl ToolConfig {
        pub fn new(tool_name: &str, base_dir: PathBuf) -> Self {
            ToolConfig {
                tool_name: tool_name.to_string(),
                base_dir,
                enable_logging: false,
            }
        }

        pub fn with_logging(mut self, enable: bool) -> Self {
            self.enable_logging = enable;
            self
        }
    }

    /// Run `tool_fn` with directory context, timing and optional logging
    ///
    /// `tool_fn` returns the one-line summary printed at the end.
    pub fn run_tool<F>(config: ToolConfig, tool_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ToolLogger) -> Result<String>,
    {
        let start = Instant::now();

        println!("Entering directory '{}'", config.base_dir.display());
        println!();

        let mut logger = if config.enable_logging {
            ToolLogger::new(&config.tool_name)
        } else {
            ToolLogger::new_disabled()
        };

        let summary = tool_fn(&mut logger)?;

        println!();
        println!("{summary}");
        println!("Completed in {}ms", start.elapsed().as_millis());

        if config.enable_logging {
            logger.finalize(&summary);
        }
        Ok(())
    }
}
