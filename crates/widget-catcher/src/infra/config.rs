//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs_next::{config_dir, data_dir};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::expander::{
    BACKWARD_ANCHOR_BUDGET, BALANCE_BUDGET, ExpansionBudgets, FORWARD_ANCHOR_BUDGET,
};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".widget-catcher/config.toml";
const USAGE_FILE: &str = "widget-catcher/usage.json";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub budgets: Budgets,
    #[serde(default)]
    pub feedback: Feedback,
    #[serde(default)]
    pub clipboard: ClipboardSettings,
    #[serde(default)]
    pub usage: Usage,
}

/// Iteration ceilings for the expander phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Budgets {
    #[serde(default)]
    backward_anchor: Option<usize>,
    #[serde(default)]
    forward_anchor: Option<usize>,
    #[serde(default)]
    balance: Option<usize>,
}

impl Budgets {
    pub fn backward_anchor(&self) -> usize {
        self.backward_anchor.unwrap_or(BACKWARD_ANCHOR_BUDGET)
    }

    pub fn forward_anchor(&self) -> usize {
        self.forward_anchor.unwrap_or(FORWARD_ANCHOR_BUDGET)
    }

    pub fn balance(&self) -> usize {
        self.balance.unwrap_or(BALANCE_BUDGET)
    }

    pub fn to_expansion_budgets(&self) -> ExpansionBudgets {
        ExpansionBudgets {
            backward_anchor: self.backward_anchor(),
            forward_anchor: self.forward_anchor(),
            balance: self.balance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Feedback {
    #[serde(default)]
    snackbar_duration_ms: Option<u64>,
}

impl Feedback {
    fn default_snackbar_duration_ms() -> u64 {
        1500
    }

    pub fn snackbar_duration_ms(&self) -> u64 {
        self.snackbar_duration_ms
            .unwrap_or_else(Self::default_snackbar_duration_ms)
    }

    pub fn snackbar_duration(&self) -> Duration {
        Duration::from_millis(self.snackbar_duration_ms())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClipboardSettings {
    #[serde(default)]
    fallback_commands: Option<bool>,
}

impl ClipboardSettings {
    fn default_fallback_commands() -> bool {
        true
    }

    pub fn fallback_commands(&self) -> bool {
        self.fallback_commands
            .unwrap_or_else(Self::default_fallback_commands)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Usage {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Usage {
    fn default_enabled() -> bool {
        true
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or_else(Self::default_enabled)
    }

    /// Location of the usage counter file, if one can be determined.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| data_dir().map(|base| base.join(USAGE_FILE)))
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    usage_file: Option<PathBuf>,
    balance_budget: Option<usize>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            usage_file: env::var_os("WIDGET_CATCHER_USAGE_FILE").map(PathBuf::from),
            balance_budget: env::var("WIDGET_CATCHER_BALANCE_BUDGET")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
        }
    }

    #[cfg(test)]
    fn for_tests(usage_file: &str, balance_budget: usize) -> Self {
        Self {
            usage_file: Some(PathBuf::from(usage_file)),
            balance_budget: Some(balance_budget),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_explicit(None)
    }

    /// Like [`Config::load`], with an extra file layered on top of the workspace config.
    pub fn load_with_explicit(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        let mut config = Self::load_with_layers(global, workspace, EnvOverrides::default())?;

        if let Some(path) = explicit {
            config = config.merge(Self::from_file(path)?);
        }

        Ok(apply_env_overrides(config, env))
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            budgets: merge_budgets(self.budgets, other.budgets),
            feedback: merge_feedback(self.feedback, other.feedback),
            clipboard: merge_clipboard(self.clipboard, other.clipboard),
            usage: merge_usage(self.usage, other.usage),
        }
    }
}

fn merge_budgets(mut base: Budgets, overlay: Budgets) -> Budgets {
    if let Some(value) = overlay.backward_anchor {
        base.backward_anchor = Some(value);
    }
    if let Some(value) = overlay.forward_anchor {
        base.forward_anchor = Some(value);
    }
    if let Some(value) = overlay.balance {
        base.balance = Some(value);
    }
    base
}

fn merge_feedback(base: Feedback, overlay: Feedback) -> Feedback {
    Feedback {
        snackbar_duration_ms: overlay.snackbar_duration_ms.or(base.snackbar_duration_ms),
    }
}

fn merge_clipboard(base: ClipboardSettings, overlay: ClipboardSettings) -> ClipboardSettings {
    ClipboardSettings {
        fallback_commands: overlay.fallback_commands.or(base.fallback_commands),
    }
}

fn merge_usage(base: Usage, overlay: Usage) -> Usage {
    Usage {
        enabled: overlay.enabled.or(base.enabled),
        path: overlay.path.or(base.path),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("widget-catcher/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(path) = env.usage_file {
        config.usage.path = Some(path);
    }
    if let Some(balance) = env.balance_budget {
        config.budgets.balance = Some(balance);
    }
    config
}
