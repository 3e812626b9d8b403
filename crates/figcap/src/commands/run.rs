//! `figcap run` command implementation.

use std::path::PathBuf;

use clap::Args;
use figcap_config::{CliSettings, Config, DialectChoice};
use figcap_pipeline::{
    DirectoryArchive, DirectoryPackager, PassthroughImages, Pipeline, RunStats,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the run command.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Path to configuration file (default: auto-discover figcap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with one sub-directory per paper (overrides config).
    #[arg(short, long, env = "FIGCAP_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Directory receiving image-caption pairs (overrides config).
    #[arg(short, long, env = "FIGCAP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Worker threads (overrides config; 0 picks 1.5 x cores).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Markup dialect: auto, latex or jats (overrides config).
    #[arg(short, long)]
    dialect: Option<DialectChoice>,
}

impl RunArgs {
    /// Execute the run command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the archive cannot be read.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            input_dir: self.input_dir,
            output_dir: self.output_dir,
            dialect: self.dialect,
            workers: self.workers,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.field("Config", path.display());
        }
        output.field("Input", config.input_resolved.dir.display());
        output.field("Output", config.output_resolved.dir.display());
        output.field("Dialect", config.input_resolved.dialect);

        let archive = DirectoryArchive::new(
            &config.input_resolved.dir,
            config.extract.accepted_extensions.clone(),
        );
        let packager =
            DirectoryPackager::new(&config.output_resolved.dir, config.pipeline.skip_existing)?;
        let pipeline = Pipeline::from_config(&config);
        output.field("Workers", pipeline.workers());

        let stats = pipeline.run(&archive, &PassthroughImages, &packager)?;
        print_summary(&output, &stats);
        Ok(())
    }
}

fn print_summary(output: &Output, stats: &RunStats) {
    output.heading("Run summary");
    output.field("Documents processed", stats.documents);
    if stats.documents_skipped > 0 {
        output.field("Skipped (already packaged)", stats.documents_skipped);
    }
    output.field("Documents with captions", stats.documents_with_captions);
    output.field("Markup files", stats.markup_files);
    output.field(
        "Mean caption length",
        format!("{:.1} characters", stats.mean_caption_length()),
    );

    output.failures("Documents failed to load", stats.documents_failed);
    output.failures("Unparseable markup files", stats.unparseable);
    output.failures("Image failures", stats.image_failures);
    output.failures("Write failures", stats.write_failures);

    output.success(&format!("Pairs written: {}", stats.pairs_written));
}
