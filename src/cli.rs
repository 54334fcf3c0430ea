use crate::config::PanelConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    config_path: Option<PathBuf>,
    acts_label: Option<String>,
    entities_label: Option<String>,
    drop_state: Option<i32>,
    expand_roots: Option<bool>,
}

impl CliOverrides {
    /// Parses `--flag value` pairs. The iterator must not include the program name or
    /// positional arguments.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            let Some(key) = flag.strip_prefix("--") else {
                bail!("Unexpected argument '{flag}'. Flags take the form --name value.");
            };
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "config" => overrides.config_path = Some(PathBuf::from(value)),
                "acts-label" => overrides.acts_label = Some(non_empty(flag, value)?),
                "entities-label" => overrides.entities_label = Some(non_empty(flag, value)?),
                "drop-state" => {
                    let state = value.parse::<i32>().with_context(|| format!("Invalid drop state '{value}'"))?;
                    if state < 0 {
                        bail!("Invalid drop state '{value}'. Entity states are never negative.");
                    }
                    overrides.drop_state = Some(state);
                }
                "expand-roots" => overrides.expand_roots = Some(parse_bool_flag("expand-roots", &value)?),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --config, --acts-label, --entities-label, \
                     --drop-state, --expand-roots."
                ),
            }
        }
        Ok(overrides)
    }

    pub fn config_path(&self) -> Option<&PathBuf> {
        self.config_path.as_ref()
    }

    pub fn into_config_overrides(self) -> PanelConfigOverrides {
        PanelConfigOverrides {
            acts_folder_label: self.acts_label,
            entities_folder_label: self.entities_label,
            default_drop_state: self.drop_state,
            expand_roots_on_first_load: self.expand_roots,
        }
    }
}

fn non_empty(flag: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        bail!("Expected a non-empty label after '{flag}'");
    }
    Ok(value)
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
