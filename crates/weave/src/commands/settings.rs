//! `weave settings` command implementations.

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use weave_config::{Config, RenderSettings};

use crate::error::CliError;
use crate::output::Output;

/// Render settings subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsCommand {
    /// Show the current render settings.
    Show(ShowArgs),
    /// Change one setting and save the snapshot.
    Set(SetArgs),
    /// Restore every setting to its default.
    Reset(ResetArgs),
}

impl SettingsCommand {
    /// Execute the settings command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or the settings snapshot cannot
    /// be loaded or saved.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        match self {
            Self::Show(args) => args.execute(),
            Self::Set(args) => args.execute(),
            Self::Reset(args) => args.execute(),
        }
    }
}

/// Arguments for `settings show`.
#[derive(Args)]
pub(crate) struct ShowArgs {
    /// Print the snapshot as JSON.
    #[arg(long)]
    json: bool,

    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ShowArgs {
    fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let current = config.open_settings()?.current();

        let text = if self.json {
            serde_json::to_string_pretty(&current)? + "\n"
        } else {
            format_settings(&current, &Output::new())
        };
        std::io::stdout().lock().write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Arguments for `settings set`.
#[derive(Args)]
pub(crate) struct SetArgs {
    /// Setting key (e.g., `allow_network_access`).
    key: String,

    /// New value.
    value: String,

    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl SetArgs {
    fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let settings = config.open_settings()?;

        let updated = settings.set(&self.key, &self.value)?;

        let value = updated.get(&self.key).unwrap_or_default();
        Output::new().success(&format!("{} = {value}", self.key));
        Ok(())
    }
}

/// Arguments for `settings reset`.
#[derive(Args)]
pub(crate) struct ResetArgs {
    /// Path to configuration file (default: auto-discover weave.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ResetArgs {
    fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        config.open_settings()?.reset()?;

        Output::new().success(&format!(
            "Settings reset to defaults ({})",
            config.settings_path.display()
        ));
        Ok(())
    }
}

/// One block per setting: label and key, value with its default, description.
fn format_settings(settings: &RenderSettings, output: &Output) -> String {
    let mut text = String::new();
    for descriptor in RenderSettings::descriptors() {
        let value = settings.get(descriptor.key).unwrap_or_default();
        let heading = output.heading(descriptor.label);
        let default = output.muted(&format!("(default: {})", descriptor.default));
        text.push_str(&format!(
            "{heading} [{}]\n  {value} {default}\n  {}\n",
            descriptor.key, descriptor.description
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_settings_lists_every_key() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
        let settings = RenderSettings {
            max_recursion_depth: 7,
            ..RenderSettings::default()
        };

        let text = format_settings(&settings, &Output::new());

        for descriptor in RenderSettings::descriptors() {
            assert!(text.contains(&format!("[{}]", descriptor.key)));
        }
        assert!(text.contains("  7 (default: 20)"));
    }
}
