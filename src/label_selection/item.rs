use std::fmt;

use crate::cluster::{Cluster, Vector3};
use crate::cluster_container::ClusterContainer;

/// Index of an item in its `LabelSelectionModel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    PartiallyChecked,
    Checked,
}

impl CheckState {
    pub fn from_checked(checked: bool) -> CheckState {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let str = match self {
            CheckState::Unchecked => "unchecked",
            CheckState::PartiallyChecked => "partial",
            CheckState::Checked => "checked",
        };
        formatter.write_str(str)
    }
}

/// What a display item stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemKind {
    /// A label the user turns on and off.  `key` is `None` for a hierarchy
    /// leaf whose name isn't in the label table.
    Label { key: Option<i32>, rgba: [u8; 4] },
    /// A grouping node that is not itself a label.
    Hierarchy,
}

/// Discriminant of `ItemKind`, for filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    Label,
    Hierarchy,
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Label { .. } => ItemType::Label,
            ItemKind::Hierarchy => ItemType::Hierarchy,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LabelSelectionItem {
    text: String,
    ontology_id: String,
    kind: ItemKind,
    check_state: CheckState,
    enabled: bool,
    tool_tip: String,
    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    raw_clusters: Vec<Cluster>,
    merged_clusters: Vec<Cluster>,
    pub(crate) my_and_children_merged_clusters: Vec<Cluster>,
    pub(crate) center_of_gravity: Option<Vector3>,
}

impl LabelSelectionItem {
    pub fn new_label(text: &str, ontology_id: &str, key: Option<i32>, rgba: [u8; 4]) -> Self {
        Self::new(text, ontology_id, ItemKind::Label { key, rgba })
    }

    pub fn new_hierarchy(text: &str, ontology_id: &str) -> Self {
        Self::new(text, ontology_id, ItemKind::Hierarchy)
    }

    fn new(text: &str, ontology_id: &str, kind: ItemKind) -> Self {
        LabelSelectionItem {
            text: text.to_string(),
            ontology_id: ontology_id.to_string(),
            kind,
            check_state: CheckState::Unchecked,
            enabled: true,
            tool_tip: String::new(),
            parent: None,
            children: Vec::new(),
            raw_clusters: Vec::new(),
            merged_clusters: Vec::new(),
            my_and_children_merged_clusters: Vec::new(),
            center_of_gravity: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ontology_id(&self) -> &str {
        &self.ontology_id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn label_key(&self) -> Option<i32> {
        match self.kind {
            ItemKind::Label { key, .. } => key,
            ItemKind::Hierarchy => None,
        }
    }

    /// White for anything that isn't a label.
    pub fn rgba(&self) -> [u8; 4] {
        match self.kind {
            ItemKind::Label { rgba, .. } => rgba,
            ItemKind::Hierarchy => [255, 255, 255, 255],
        }
    }

    pub fn check_state(&self) -> CheckState {
        self.check_state
    }

    pub fn set_check_state(&mut self, check_state: CheckState) {
        self.check_state = check_state;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn tool_tip(&self) -> &str {
        &self.tool_tip
    }

    /// Add `text` on a new line of the tool tip.
    pub fn append_to_tool_tip(&mut self, text: &str) {
        if !self.tool_tip.is_empty() {
            self.tool_tip.push('\n');
        }
        self.tool_tip.push_str(text);
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn raw_clusters(&self) -> &[Cluster] {
        &self.raw_clusters
    }

    /// The raw clusters merged into at most one cluster per location type.
    pub fn merged_clusters(&self) -> &[Cluster] {
        &self.merged_clusters
    }

    /// This item's merged clusters combined with those of all descendants;
    /// filled in when the model computes centers of gravity.
    pub fn my_and_children_merged_clusters(&self) -> &[Cluster] {
        &self.my_and_children_merged_clusters
    }

    pub fn center_of_gravity(&self) -> Option<Vector3> {
        self.center_of_gravity
    }

    pub fn set_raw_clusters(&mut self, raw_clusters: Vec<Cluster>) {
        let mut container = ClusterContainer::new();
        for cluster in &raw_clusters {
            container.add_cluster(cluster.clone());
        }
        self.merged_clusters = container
            .merge_disjoint_right_left_clusters()
            .iter()
            .cloned()
            .collect();
        self.raw_clusters = raw_clusters;
    }

    /// Single-line description used by `LabelSelectionModel::to_formatted_string`.
    pub fn to_formatted_line(&self, indentation: &str) -> String {
        let mut line = format!("{}{}", indentation, self.text);
        match self.kind {
            ItemKind::Label { key: Some(key), .. } => line.push_str(&format!(" key={}", key)),
            ItemKind::Label { key: None, .. } => line.push_str(" key=none"),
            ItemKind::Hierarchy => {}
        }
        line.push_str(&format!(" [{}]", self.check_state));
        if !self.enabled {
            line.push_str(" (disabled)");
        }
        if !self.merged_clusters.is_empty() {
            line.push_str(&format!(" clusters={}", self.merged_clusters.len()));
        }
        line
    }
}
