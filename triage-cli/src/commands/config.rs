//! `triage config show`: print the fully resolved, validated configuration.

use crate::app::App;
use crate::output::{ConfigView, Output, OutputFormat};

pub fn show(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    Output::new(format).write(&ConfigView(app.config.clone()))?;
    Ok(())
}
