use labeltree::file_format::clusters::read_cluster_container;
use labeltree::file_format::hierarchy::Hierarchy;
use labeltree::file_format::label_table::{DisplayGroup, LabelTable};
use labeltree::label_selection::{CheckState, ItemType, LabelSelectionModel, SyncDirection};
use labeltree::logging::init_logging;

const LABEL_TABLE_JSON: &str = r#"{
    "labels": [
        { "key": 0, "name": "???", "rgba": [0, 0, 0, 0] },
        { "key": 1, "name": "V1", "rgba": [1, 0, 0, 1] },
        { "key": 2, "name": "V2", "rgba": [0, 1, 0, 1] },
        { "key": 3, "name": "M1", "rgba": [0, 0, 1, 1] },
        { "key": 10, "name": "visual", "rgba": [0.5, 0.5, 0.5, 1] },
        { "key": 20, "name": "orphan" }
    ]
}"#;

const HIERARCHY_JSON: &str = r#"[
    {
        "name": "cortex",
        "id": 688,
        "children": [
            {
                "name": "visual",
                "children": [{ "name": "V1" }, { "name": "V2" }, { "name": "V3" }]
            },
            { "name": "motor", "children": { "name": "M1" } }
        ]
    }
]"#;

const CLUSTERS_JSON: &str = r#"{
    "clusters": [
        { "name": "V1", "key": 1, "coordinates": [[-10, 0, 0]] },
        { "name": "V1", "key": 1, "coordinates": [[10, 0, 0]] },
        { "name": "V2", "key": 2, "coordinates": [[-20, 4, 0]] }
    ],
    "keys_not_in_any_cluster": [3, 10]
}"#;

fn label_table() -> LabelTable {
    let mut table = LabelTable::from_json_str(LABEL_TABLE_JSON).unwrap();
    let mut hierarchy = Hierarchy::new();
    hierarchy.read_json(HIERARCHY_JSON).unwrap();
    table.set_hierarchy(hierarchy);
    table
}

fn build(table: &LabelTable) -> LabelSelectionModel {
    let clusters = read_cluster_container(CLUSTERS_JSON).unwrap();
    LabelSelectionModel::new(
        "atlas.dlabel.nii: map 1",
        table,
        Some(&clusters),
        DisplayGroup::GroupA,
        0,
        true,
    )
}

#[test]
fn test_model_from_files() {
    init_logging();
    let model = build(&label_table());
    assert!(model.is_valid());

    let expected = [
        "   cortex [checked]",
        "      visual key=10 [checked]",
        "         V1 key=1 [checked] clusters=2",
        "         V2 key=2 [checked] clusters=1",
        "         V3 key=none [checked] (disabled)",
        "      motor [checked]",
        "         M1 key=3 [checked] (disabled)",
        "   Label Table Only [checked]",
        "      orphan key=20 [checked]",
    ]
    .join("\n");
    assert_eq!(model.to_formatted_string(""), expected);

    let diagnostics = [
        "   No labels in the label table were found for these childless elements in the hierarchy:",
        "      V3",
        "   These labels not in hierarchy have been added to the group \"Label Table Only\": ",
        "      orphan",
    ]
    .join("\n");
    assert_eq!(model.diagnostics().to_formatted_string(), diagnostics);

    let cortex = model.item(model.top_level_items()[0]);
    assert_eq!(cortex.ontology_id(), "688");
    assert_eq!(cortex.item_type(), ItemType::Hierarchy);

    // Key 10 is unused, but "visual" stays enabled because it has children.
    let visual = model.item_for_label_key(10).unwrap();
    assert!(model.item(visual).is_enabled());
    assert_eq!(
        model.item(visual).tool_tip(),
        "This label is not used by any brainordinates"
    );
    assert_eq!(model.item(visual).my_and_children_merged_clusters().len(), 3);

    assert_eq!(model.all_descendants().len(), 9);
    assert_eq!(model.all_descendants_of_type(ItemType::Hierarchy).len(), 3);
}

#[test]
fn test_unchecking_and_synchronizing() {
    let mut table = label_table();
    let mut model = build(&table);

    let v1 = model.item_for_label_key(1).unwrap();
    model.set_item_checked(v1, false);
    let expected = [
        ">   cortex [partial]",
        ">      visual key=10 [partial]",
        ">         V1 key=1 [unchecked] clusters=2",
        ">         V2 key=2 [checked] clusters=1",
        ">         V3 key=none [checked] (disabled)",
        ">      motor [checked]",
        ">         M1 key=3 [checked] (disabled)",
        ">   Label Table Only [checked]",
        ">      orphan key=20 [checked]",
    ]
    .join("\n");
    assert_eq!(model.to_formatted_string(">"), expected);

    model.synchronize_selections_with_label_table(&mut table, SyncDirection::ToLabelTable);
    let v1_selection = table.label(1).unwrap().selection();
    assert!(!v1_selection.is_selected(DisplayGroup::GroupA, 0));
    assert!(v1_selection.is_selected(DisplayGroup::GroupB, 0));

    let mut rebuilt = build(&table);
    assert!(rebuilt.is_label_checked(1));
    rebuilt.synchronize_selections_with_label_table(&mut table, SyncDirection::FromLabelTable);
    assert!(!rebuilt.is_label_checked(1));
    assert_eq!(
        rebuilt.item(rebuilt.top_level_items()[0]).check_state(),
        CheckState::PartiallyChecked
    );
}

#[test]
fn test_scene_survives_json() {
    let table = label_table();
    let mut model = build(&table);
    model.set_checked_status_of_all_items(false);
    let m1 = model.item_for_label_key(3).unwrap();
    model.set_item_checked(m1, true);

    let scene = model.save_to_scene("labelSelection");
    insta::assert_json_snapshot!(scene, @r###"
    {
      "name": "labelSelection",
      "class_name": "LabelSelectionItemModel",
      "version": 1,
      "string_arrays": {
        "CheckedLabels": [
          "M1"
        ]
      }
    }
    "###);

    let mut restored = build(&table);
    restored.restore_from_scene(Some(&scene));
    assert!(restored.is_label_checked(3));
    assert!(!restored.is_label_checked(1));
    let motor = restored.item(restored.item_for_label_key(3).unwrap()).parent().unwrap();
    assert_eq!(restored.item(motor).check_state(), CheckState::Checked);

    restored.restore_from_scene(None);
    assert!(restored.is_label_checked(3));
}
