//! `figcap extract` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use figcap_config::Config;
use figcap_core::{AssociationResult, Dialect, GraphicSet};
use figcap_pipeline::Pipeline;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the extract command.
#[derive(Args)]
pub(crate) struct ExtractArgs {
    /// Path to the markup file (`.tex`, `.nxml`, `.xml`).
    file: PathBuf,

    /// Markup dialect (default: from the file extension).
    #[arg(short, long)]
    dialect: Option<Dialect>,

    /// Kept graphic filename; repeat for several. Without any, every
    /// resolvable graphic is accepted.
    #[arg(short, long = "graphic", value_name = "NAME")]
    graphics: Vec<String>,

    /// Path to configuration file (default: auto-discover figcap.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ExtractArgs {
    /// Execute the extract command.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;
        let dialect = resolve_dialect(&self.file, self.dialect)?;

        let graphics =
            (!self.graphics.is_empty()).then(|| GraphicSet::new(self.graphics.iter().cloned()));
        let result = extract_file(&config, &self.file, dialect, graphics.as_ref())?;

        if result.is_empty() {
            output.warning(&format!("No captioned figures in {}", self.file.display()));
        }
        output.data(&serde_json::to_string_pretty(&result)?)?;
        Ok(())
    }
}

/// Pick the dialect from the flag, falling back to the file extension.
fn resolve_dialect(file: &Path, flag: Option<Dialect>) -> Result<Dialect, CliError> {
    flag.or_else(|| Dialect::for_markup_file(&file.to_string_lossy()))
        .ok_or_else(|| {
            CliError::Validation(format!(
                "cannot tell the dialect of {}; pass --dialect latex or --dialect jats",
                file.display()
            ))
        })
}

/// Run the configured extractor on one file.
fn extract_file(
    config: &Config,
    file: &Path,
    dialect: Dialect,
    graphics: Option<&GraphicSet>,
) -> Result<AssociationResult, CliError> {
    let body = std::fs::read(file)?;
    let pipeline = Pipeline::from_config(config);
    Ok(pipeline.extractor(dialect).try_extract(&body, graphics)?)
}
