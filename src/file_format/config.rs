use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::label_table::DisplayGroup;
use crate::errors::Result;

/// Settings for `label-tree-tool`, read from a TOML file.  Every field is
/// optional in the file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Log hierarchy/label table mismatches found while building a label
    /// selection model.
    pub log_mismatched_labels: bool,
    /// Which display group's selections a model synchronizes with.
    pub display_group: DisplayGroup,
    /// Tab whose selections are used when `display_group` is "tab".
    pub tab_index: usize,
    /// Merge clusters per key and location before printing them.
    pub merge_clusters: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            log_mismatched_labels: true,
            display_group: DisplayGroup::All,
            tab_index: 0,
            merge_clusters: true,
        }
    }
}

pub fn parse(text: &str) -> Result<ToolConfig> {
    Ok(toml::from_str(text)?)
}

pub fn load(path: &Path) -> Result<ToolConfig> {
    let text = fs::read_to_string(path)?;
    let config = parse(&text)?;
    info!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}
