use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::types::TabId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_character")]
    pub character: String,

    #[serde(default = "default_bank_tabs")]
    pub bank_tabs: usize,

    #[serde(default)]
    pub storage_dir: Option<PathBuf>,

    #[serde(default)]
    pub settings: PlaceholderSettings,
}

/// Which catalog items get a placeholder when filling from the completion log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionLogPolicy {
    #[default]
    Disabled,
    OnlyFound,
    All,
}

/// User-facing placeholder behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderSettings {
    /// Only keep placeholders for items that were locked when they ran out
    #[serde(default)]
    pub only_locked: bool,

    /// Real placeholders count against bank space (fillers never do)
    #[serde(default = "default_true")]
    pub use_slots: bool,

    #[serde(default)]
    pub disabled_tabs: BTreeSet<TabId>,

    #[serde(default)]
    pub completion_log: CompletionLogPolicy,
}

impl PlaceholderSettings {
    pub fn is_tab_disabled(&self, tab: TabId) -> bool {
        self.disabled_tabs.contains(&tab)
    }
}

impl Default for PlaceholderSettings {
    fn default() -> Self {
        Self {
            only_locked: false,
            use_slots: default_true(),
            disabled_tabs: BTreeSet::new(),
            completion_log: CompletionLogPolicy::default(),
        }
    }
}

// Default values
fn default_character() -> String {
    "default".to_string()
}

fn default_bank_tabs() -> usize {
    12
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            character: default_character(),
            bank_tabs: default_bank_tabs(),
            storage_dir: None,
            settings: PlaceholderSettings::default(),
        }
    }
}

impl Config {
    /// Directory holding the character and account storage files
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bank-placeholders")
        })
    }
}
