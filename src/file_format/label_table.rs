use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::hierarchy::Hierarchy;
use crate::errors::{LabelTreeError, Result};

/// Name GIFTI uses for the label that marks unlabeled brainordinates.
pub const UNASSIGNED_LABEL_NAME: &str = "???";

/// UI-state partition that owns an independent set of label selections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayGroup {
    #[default]
    All,
    #[serde(rename = "a")]
    GroupA,
    #[serde(rename = "b")]
    GroupB,
    #[serde(rename = "c")]
    GroupC,
    #[serde(rename = "d")]
    GroupD,
    /// Selections belong to a specific tab.
    Tab,
}

/// Per-label selection flags for every display group and tab.  Anything
/// never set explicitly is selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelectionState {
    groups: HashMap<DisplayGroup, bool>,
    tabs: HashMap<usize, bool>,
}

impl LabelSelectionState {
    pub fn is_selected(&self, display_group: DisplayGroup, tab_index: usize) -> bool {
        match display_group {
            DisplayGroup::Tab => self.tabs.get(&tab_index).copied().unwrap_or(true),
            group => self.groups.get(&group).copied().unwrap_or(true),
        }
    }

    pub fn set_selected(&mut self, display_group: DisplayGroup, tab_index: usize, selected: bool) {
        match display_group {
            DisplayGroup::Tab => {
                self.tabs.insert(tab_index, selected);
            }
            group => {
                self.groups.insert(group, selected);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    key: i32,
    name: String,
    /// Red, green, blue and alpha in 0..=1.
    rgba: [f32; 4],
    selection: LabelSelectionState,
}

impl Label {
    pub fn new(key: i32, name: &str, rgba: [f32; 4]) -> Self {
        Label {
            key,
            name: name.to_string(),
            rgba,
            selection: LabelSelectionState::default(),
        }
    }

    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rgba(&self) -> [f32; 4] {
        self.rgba
    }

    pub fn selection(&self) -> &LabelSelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut LabelSelectionState {
        &mut self.selection
    }
}

/// Schema of label table JSON files.
#[derive(Clone, Debug, Deserialize)]
struct LabelTableJson {
    #[serde(default)]
    unassigned_key: Option<i32>,
    labels: Vec<LabelJson>,
}

#[derive(Clone, Debug, Deserialize)]
struct LabelJson {
    key: i32,
    name: String,
    #[serde(default = "opaque_white")]
    rgba: [f32; 4],
}

fn opaque_white() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

/// Key → label metadata plus the hierarchy used to group labels for display.
#[derive(Clone, Debug, Default)]
pub struct LabelTable {
    labels: BTreeMap<i32, Label>,
    hierarchy: Hierarchy,
    unassigned_key: Option<i32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the label with `label.key()`.
    pub fn add_label(&mut self, label: Label) {
        self.labels.insert(label.key, label);
    }

    pub fn label(&self, key: i32) -> Option<&Label> {
        self.labels.get(&key)
    }

    pub fn label_mut(&mut self, key: i32) -> Option<&mut Label> {
        self.labels.get_mut(&key)
    }

    /// The label with the given name; if several share it, the lowest key.
    pub fn label_by_name(&self, name: &str) -> Option<&Label> {
        self.labels.values().find(|label| label.name == name)
    }

    pub fn label_name(&self, key: i32) -> Option<&str> {
        self.labels.get(&key).map(|label| label.name.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    /// Label keys ordered by label name, then key.
    pub fn label_keys_sorted_by_name(&self) -> Vec<i32> {
        let mut labels: Vec<&Label> = self.labels.values().collect();
        labels.sort_by(|a, b| a.name.cmp(&b.name).then(a.key.cmp(&b.key)));
        labels.iter().map(|label| label.key).collect()
    }

    /// The explicitly configured unassigned key, else the key of the label
    /// named `???`.
    pub fn unassigned_label_key(&self) -> Option<i32> {
        self.unassigned_key.or_else(|| {
            self.label_by_name(UNASSIGNED_LABEL_NAME)
                .map(|label| label.key)
        })
    }

    pub fn set_unassigned_label_key(&mut self, key: Option<i32>) {
        self.unassigned_key = key;
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }

    pub fn set_hierarchy(&mut self, hierarchy: Hierarchy) {
        self.hierarchy = hierarchy;
    }

    pub fn from_json_str(text: &str) -> Result<LabelTable> {
        let parsed: LabelTableJson = serde_json::from_str(text)
            .map_err(|err| LabelTreeError::LabelTable(err.to_string()))?;

        let mut table = LabelTable::new();
        table.unassigned_key = parsed.unassigned_key;
        for label in parsed.labels {
            if table.labels.contains_key(&label.key) {
                return Err(LabelTreeError::LabelTable(format!(
                    "label key {} appears more than once",
                    label.key
                )));
            }
            table.add_label(Label::new(label.key, &label.name, label.rgba));
        }
        Ok(table)
    }

    pub fn from_json_file(path: &Path) -> Result<LabelTable> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
