use std::collections::{BTreeMap, BTreeSet};

use super::item::{CheckState, ItemId, ItemType, LabelSelectionItem};
use crate::cluster::{center_of_gravity, Cluster, Vector3};
use crate::cluster_container::ClusterContainer;
use crate::file_format::hierarchy::HierarchyItem;
use crate::file_format::label_table::{DisplayGroup, Label, LabelTable};
use crate::scene::SceneClass;

/// Group that collects labels present in the label table but absent from
/// the hierarchy.
pub const LABEL_TABLE_ONLY_GROUP: &str = "Label Table Only";

const SCENE_CLASS_NAME: &str = "LabelSelectionItemModel";
const SCENE_CLASS_VERSION: u32 = 1;
const CHECKED_LABELS_SCENE_KEY: &str = "CheckedLabels";

const NO_LABEL_TOOL_TIP: &str = "There is no label in the label table for this name";
const NOT_IN_CLUSTERS_TOOL_TIP: &str = "This label is not used by any brainordinates";

/// Which way `synchronize_selections_with_label_table` copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncDirection {
    /// Checked state of the tree is written into the label table.
    ToLabelTable,
    /// The label table's selections are written into the tree.
    FromLabelTable,
}

/// Mismatches between the hierarchy and the label table found while
/// building a model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildDiagnostics {
    /// Childless hierarchy names with no label in the label table.
    pub missing_label_names: BTreeSet<String>,
    /// Labels missing from the hierarchy, placed under `LABEL_TABLE_ONLY_GROUP`.
    pub label_table_only_names: BTreeSet<String>,
    /// Labels whose names are interior hierarchy nodes that weren't bound
    /// to them.
    pub label_is_parent_names: BTreeSet<String>,
}

impl BuildDiagnostics {
    pub fn is_empty(&self) -> bool {
        self.missing_label_names.is_empty()
            && self.label_table_only_names.is_empty()
            && self.label_is_parent_names.is_empty()
    }

    pub fn to_formatted_string(&self) -> String {
        let mut lines = Vec::new();
        let mut section = |heading: String, names: &BTreeSet<String>| {
            if names.is_empty() {
                return;
            }
            lines.push(heading);
            lines.extend(names.iter().map(|name| format!("      {}", name)));
        };

        section(
            "   No labels in the label table were found for these childless elements in the hierarchy:"
                .to_string(),
            &self.missing_label_names,
        );
        section(
            format!(
                "   These labels not in hierarchy have been added to the group \"{}\": ",
                LABEL_TABLE_ONLY_GROUP
            ),
            &self.label_table_only_names,
        );
        section(
            "   Label from label table is in the element hierarchy but element contains children:"
                .to_string(),
            &self.label_is_parent_names,
        );
        lines.join("\n")
    }
}

/// Checkbox tree binding a label table's hierarchy to its labels and to
/// the clusters using those labels.
///
/// Items live in an arena and refer to each other by `ItemId`; the model
/// keeps its own copy of the tree, so later changes to the hierarchy do not
/// show up until a new model is built.
#[derive(Clone, Debug)]
pub struct LabelSelectionModel {
    file_and_map_name: String,
    display_group: DisplayGroup,
    tab_index: usize,
    log_mismatched_labels: bool,
    items: Vec<LabelSelectionItem>,
    top_level: Vec<ItemId>,
    label_key_to_item: BTreeMap<i32, ItemId>,
    hierarchy_parent_names: BTreeSet<String>,
    diagnostics: BuildDiagnostics,
    valid: bool,
}

impl LabelSelectionModel {
    /// Build the tree for `label_table`.  The model is invalid (and empty)
    /// when the label table has no hierarchy.
    pub fn new(
        file_and_map_name: &str,
        label_table: &LabelTable,
        cluster_container: Option<&ClusterContainer>,
        display_group: DisplayGroup,
        tab_index: usize,
        log_mismatched_labels: bool,
    ) -> Self {
        let mut model = LabelSelectionModel {
            file_and_map_name: file_and_map_name.to_string(),
            display_group,
            tab_index,
            log_mismatched_labels,
            items: Vec::new(),
            top_level: Vec::new(),
            label_key_to_item: BTreeMap::new(),
            hierarchy_parent_names: BTreeSet::new(),
            diagnostics: BuildDiagnostics::default(),
            valid: false,
        };
        model.build_model(label_table, cluster_container);
        model
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn file_and_map_name(&self) -> &str {
        &self.file_and_map_name
    }

    pub fn display_group(&self) -> DisplayGroup {
        self.display_group
    }

    pub fn tab_index(&self) -> usize {
        self.tab_index
    }

    pub fn diagnostics(&self) -> &BuildDiagnostics {
        &self.diagnostics
    }

    pub fn item(&self, id: ItemId) -> &LabelSelectionItem {
        &self.items[id.0]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut LabelSelectionItem {
        &mut self.items[id.0]
    }

    pub fn top_level_items(&self) -> &[ItemId] {
        &self.top_level
    }

    pub fn item_for_label_key(&self, key: i32) -> Option<ItemId> {
        self.label_key_to_item.get(&key).copied()
    }

    /// Every item, depth first, parents before children.
    pub fn all_descendants(&self) -> Vec<ItemId> {
        let mut ids = Vec::with_capacity(self.items.len());
        for &id in &self.top_level {
            self.collect_descendants(id, &mut ids);
        }
        ids
    }

    pub fn all_descendants_of_type(&self, item_type: ItemType) -> Vec<ItemId> {
        self.all_descendants()
            .into_iter()
            .filter(|&id| self.item(id).item_type() == item_type)
            .collect()
    }

    fn collect_descendants(&self, id: ItemId, ids: &mut Vec<ItemId>) {
        ids.push(id);
        for &child in &self.item(id).children {
            self.collect_descendants(child, ids);
        }
    }

    pub fn is_label_checked(&self, key: i32) -> bool {
        self.item_for_label_key(key)
            .map(|id| self.item(id).check_state() == CheckState::Checked)
            .unwrap_or(false)
    }

    pub fn set_checked_status_of_all_items(&mut self, checked: bool) {
        let state = CheckState::from_checked(checked);
        for item in &mut self.items {
            item.set_check_state(state);
        }
    }

    /// Check or uncheck an item and everything below it, then bring the
    /// ancestors' tri-state up to date.
    pub fn set_item_checked(&mut self, id: ItemId, checked: bool) {
        let mut subtree = Vec::new();
        self.collect_descendants(id, &mut subtree);
        let state = CheckState::from_checked(checked);
        for item_id in subtree {
            self.item_mut(item_id).set_check_state(state);
        }
        self.update_checked_state_of_all_items();
    }

    /// Recompute the check state of every item with children from its
    /// children, bottom-up.
    pub fn update_checked_state_of_all_items(&mut self) {
        for i in 0..self.top_level.len() {
            let id = self.top_level[i];
            self.set_check_state_from_children(id);
        }
    }

    fn set_check_state_from_children(&mut self, id: ItemId) -> CheckState {
        let num_children = self.item(id).children.len();
        if num_children == 0 {
            return self.item(id).check_state();
        }

        let mut checked = 0;
        let mut unchecked = 0;
        for i in 0..num_children {
            let child = self.item(id).children[i];
            match self.set_check_state_from_children(child) {
                CheckState::Checked => checked += 1,
                CheckState::Unchecked => unchecked += 1,
                CheckState::PartiallyChecked => {}
            }
        }

        let state = if checked == num_children {
            CheckState::Checked
        } else if unchecked == num_children {
            CheckState::Unchecked
        } else {
            CheckState::PartiallyChecked
        };
        self.item_mut(id).set_check_state(state);
        state
    }

    /// Copy checked state between the tree and the label table's selection
    /// for this model's display group and tab.
    pub fn synchronize_selections_with_label_table(
        &mut self,
        label_table: &mut LabelTable,
        direction: SyncDirection,
    ) {
        for (&key, &id) in &self.label_key_to_item {
            let label = match label_table.label_mut(key) {
                Some(label) => label,
                None => continue,
            };
            match direction {
                SyncDirection::ToLabelTable => {
                    let selected = self.items[id.0].check_state() != CheckState::Unchecked;
                    label
                        .selection_mut()
                        .set_selected(self.display_group, self.tab_index, selected);
                }
                SyncDirection::FromLabelTable => {
                    let selected = label
                        .selection()
                        .is_selected(self.display_group, self.tab_index);
                    self.items[id.0].set_check_state(CheckState::from_checked(selected));
                }
            }
        }

        if direction == SyncDirection::FromLabelTable {
            self.update_checked_state_of_all_items();
        }
    }

    pub fn to_formatted_string(&self, indentation: &str) -> String {
        let mut lines = Vec::new();
        for &id in &self.top_level {
            self.format_item(id, &format!("{}   ", indentation), &mut lines);
        }
        lines.join("\n")
    }

    fn format_item(&self, id: ItemId, indentation: &str, lines: &mut Vec<String>) {
        let item = self.item(id);
        lines.push(item.to_formatted_line(indentation));
        let child_indentation = format!("{}   ", indentation);
        for &child in &item.children {
            self.format_item(child, &child_indentation, lines);
        }
    }

    /// Save the names of the fully checked labels.
    pub fn save_to_scene(&self, instance_name: &str) -> SceneClass {
        let mut scene = SceneClass::new(instance_name, SCENE_CLASS_NAME, SCENE_CLASS_VERSION);
        let checked_label_names: Vec<String> = self
            .all_descendants_of_type(ItemType::Label)
            .into_iter()
            .map(|id| self.item(id))
            .filter(|item| item.check_state() == CheckState::Checked)
            .map(|item| item.text().to_string())
            .collect();
        if !checked_label_names.is_empty() {
            scene.add_string_array(CHECKED_LABELS_SCENE_KEY, checked_label_names);
        }
        scene
    }

    /// Restore checked labels saved by `save_to_scene`.  A scene without
    /// checked labels checks everything.
    pub fn restore_from_scene(&mut self, scene: Option<&SceneClass>) {
        let scene = match scene {
            Some(scene) => scene,
            None => return,
        };

        let checked_label_names: BTreeSet<&str> = scene
            .string_array(CHECKED_LABELS_SCENE_KEY)
            .unwrap_or_default()
            .iter()
            .map(String::as_str)
            .collect();

        if checked_label_names.is_empty() {
            self.set_checked_status_of_all_items(true);
        } else {
            for id in self.all_descendants_of_type(ItemType::Label) {
                let checked = checked_label_names.contains(self.item(id).text());
                self.item_mut(id)
                    .set_check_state(CheckState::from_checked(checked));
            }
        }

        self.update_checked_state_of_all_items();
    }

    /// Combine an item's merged clusters with those of all its descendants
    /// and set its center of gravity from the result.
    pub fn set_center_of_gravity_from_children(&mut self, id: ItemId) -> Option<Vector3> {
        let mut container = ClusterContainer::new();
        for i in 0..self.item(id).children.len() {
            let child = self.item(id).children[i];
            self.set_center_of_gravity_from_children(child);
            for cluster in self.item(child).my_and_children_merged_clusters() {
                container.add_cluster(cluster.clone());
            }
        }
        for cluster in self.item(id).merged_clusters() {
            container.add_cluster(cluster.clone());
        }

        let merged: Vec<Cluster> = container
            .merge_disjoint_right_left_clusters()
            .iter()
            .cloned()
            .collect();
        let coordinates: Vec<Vector3> = merged
            .iter()
            .flat_map(|cluster| cluster.coordinates().iter().copied())
            .collect();
        let cog = center_of_gravity(&coordinates);

        let item = self.item_mut(id);
        item.my_and_children_merged_clusters = merged;
        item.center_of_gravity = cog;
        cog
    }

    fn push_item(&mut self, mut item: LabelSelectionItem, parent: Option<ItemId>) -> ItemId {
        let id = ItemId(self.items.len());
        item.parent = parent;
        self.items.push(item);
        match parent {
            Some(parent) => self.items[parent.0].children.push(id),
            None => self.top_level.push(id),
        }
        id
    }

    fn attach_clusters(
        &mut self,
        id: ItemId,
        key: i32,
        cluster_container: Option<&ClusterContainer>,
    ) {
        if let Some(container) = cluster_container {
            let clusters = container
                .clusters_with_key(key)
                .into_iter()
                .cloned()
                .collect();
            self.item_mut(id).set_raw_clusters(clusters);
        }
    }

    fn build_model(&mut self, label_table: &LabelTable, cluster_container: Option<&ClusterContainer>) {
        let hierarchy = label_table.hierarchy();
        if hierarchy.is_empty() {
            return;
        }

        for hierarchy_item in hierarchy.root().children() {
            self.build_tree(hierarchy_item, None, label_table, cluster_container);
        }

        self.add_labels_missing_from_hierarchy(label_table, cluster_container);

        let text = self.diagnostics.to_formatted_string();
        if !text.is_empty() && self.log_mismatched_labels {
            info!("{}\n{}", self.file_and_map_name, text);
        }

        if let Some(container) = cluster_container {
            let keys_not_in_clusters = container.keys_not_in_any_cluster();
            let unused: Vec<ItemId> = self
                .label_key_to_item
                .iter()
                .filter(|(key, _)| keys_not_in_clusters.contains(*key))
                .map(|(_, &id)| id)
                .collect();
            for id in unused {
                let item = self.item_mut(id);
                item.append_to_tool_tip(NOT_IN_CLUSTERS_TOOL_TIP);
                // Nothing to show and nothing below it to toggle.
                if !item.has_children() {
                    item.set_enabled(false);
                }
            }
        }

        self.set_checked_status_of_all_items(true);
        self.update_checked_state_of_all_items();

        for i in 0..self.top_level.len() {
            let id = self.top_level[i];
            self.set_center_of_gravity_from_children(id);
        }

        self.valid = true;
    }

    fn build_tree(
        &mut self,
        hierarchy_item: &HierarchyItem,
        parent: Option<ItemId>,
        label_table: &LabelTable,
        cluster_container: Option<&ClusterContainer>,
    ) -> ItemId {
        let name = hierarchy_item.name();
        let label = label_table.label_by_name(name);
        let key = label.map(Label::key);
        let rgba = label_rgba(label);

        if !hierarchy_item.children().is_empty() {
            let item = match key {
                Some(_) => LabelSelectionItem::new_label(name, hierarchy_item.id(), key, rgba),
                None => LabelSelectionItem::new_hierarchy(name, hierarchy_item.id()),
            };
            let id = self.push_item(item, parent);
            if let Some(key) = key {
                self.attach_clusters(id, key, cluster_container);
            }
            for child in hierarchy_item.children() {
                self.build_tree(child, Some(id), label_table, cluster_container);
            }
            if let Some(key) = key {
                self.label_key_to_item.insert(key, id);
            }
            self.hierarchy_parent_names.insert(name.to_string());
            return id;
        }

        let id = self.push_item(
            LabelSelectionItem::new_label(name, hierarchy_item.id(), key, rgba),
            parent,
        );
        match key {
            Some(key) => {
                self.attach_clusters(id, key, cluster_container);
                self.label_key_to_item.insert(key, id);
            }
            None => {
                self.diagnostics.missing_label_names.insert(name.to_string());
                let item = self.item_mut(id);
                item.append_to_tool_tip(NO_LABEL_TOOL_TIP);
                item.set_enabled(false);
            }
        }
        id
    }

    /// Sort labels that didn't land in the tree into diagnostics, appending
    /// the ones the hierarchy doesn't mention at all to a trailing group.
    fn add_labels_missing_from_hierarchy(
        &mut self,
        label_table: &LabelTable,
        cluster_container: Option<&ClusterContainer>,
    ) {
        let unassigned_key = label_table.unassigned_label_key();
        let mut table_only_labels = Vec::new();
        for key in label_table.label_keys_sorted_by_name() {
            if Some(key) == unassigned_key || self.label_key_to_item.contains_key(&key) {
                continue;
            }
            let label = match label_table.label(key) {
                Some(label) => label,
                None => continue,
            };
            if self.hierarchy_parent_names.contains(label.name()) {
                self.diagnostics
                    .label_is_parent_names
                    .insert(label.name().to_string());
            } else {
                self.diagnostics
                    .label_table_only_names
                    .insert(label.name().to_string());
                table_only_labels.push(label);
            }
        }

        if table_only_labels.is_empty() {
            return;
        }

        let group = self.push_item(
            LabelSelectionItem::new_hierarchy(LABEL_TABLE_ONLY_GROUP, ""),
            None,
        );
        for label in table_only_labels {
            let id = self.push_item(
                LabelSelectionItem::new_label(
                    label.name(),
                    "",
                    Some(label.key()),
                    label_rgba(Some(label)),
                ),
                Some(group),
            );
            self.attach_clusters(id, label.key(), cluster_container);
            self.label_key_to_item.insert(label.key(), id);
        }
    }
}

/// Label color as bytes; white when there is no label.
fn label_rgba(label: Option<&Label>) -> [u8; 4] {
    match label {
        Some(label) => label
            .rgba()
            .map(|component| (component * 255.0).clamp(0.0, 255.0) as u8),
        None => [255, 255, 255, 255],
    }
}
