//! `figcap stats` command implementation.

use std::path::PathBuf;

use clap::Args;
use figcap_pipeline::caption_length_stats;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the stats command.
#[derive(Args)]
pub(crate) struct StatsArgs {
    /// Output directory holding `.txt` caption files.
    dir: PathBuf,

    /// Print the statistics as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl StatsArgs {
    /// Execute the stats command.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let stats = caption_length_stats(&self.dir)?;

        if self.json {
            output.data(&serde_json::to_string_pretty(&stats)?)?;
            return Ok(());
        }

        if stats.files == 0 {
            output.warning(&format!("No caption files in {}", self.dir.display()));
            return Ok(());
        }
        output.heading(&format!("Captions in {}", self.dir.display()));
        output.field("Caption files", stats.files);
        output.field("Total characters", stats.total_chars);
        output.success(&format!("Mean caption length: {:.1}", stats.mean()));
        Ok(())
    }
}
