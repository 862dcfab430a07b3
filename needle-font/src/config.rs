use anyhow::{Context, Result};
use clap::Args;
use shared::{ConfigError, NeedleFontConfig};
use std::path::Path;

/// Command-line settings that win over the preset or config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Template font to clone
    #[arg(long, global = true)]
    pub template: Option<String>,

    /// Where to write the generated font
    #[arg(long, global = true)]
    pub output: Option<String>,

    /// Timer window in hours
    #[arg(long, global = true)]
    pub hours: Option<u32>,

    /// Seconds per needle position; must divide 3600
    #[arg(long, global = true)]
    pub tick_seconds: Option<u32>,

    /// Run every stage except the final write
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long, global = true)]
    pub print_config: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut NeedleFontConfig) {
        if let Some(template) = &self.template {
            config.template.path = template.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(hours) = self.hours {
            config.window.hours = hours;
        }
        if let Some(tick_seconds) = self.tick_seconds {
            config.window.tick_seconds = tick_seconds;
        }
    }
}

pub fn load_config(path: &Path) -> Result<NeedleFontConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let config = NeedleFontConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
