use std::fs;

use labeltree::file_format::hierarchy::{Hierarchy, HierarchyItem};
use labeltree::logging::init_logging;

const CORTEX_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<CaretHierarchy Version="1">
    <Item Name="cortex">
        <Info>
            <InfoItem Key="id" Value="688"/>
            <InfoItem Key="acronym" Value="CTX"/>
        </Info>
        <Item Name="visual">
            <Item Name="V1"/>
            <Item Name="V2"/>
        </Item>
        <Item Name="motor">
            <Item Name="M1"/>
        </Item>
    </Item>
    <Item Name="cerebellum"/>
</CaretHierarchy>
"#;

fn cortex() -> Hierarchy {
    let mut hierarchy = Hierarchy::new();
    hierarchy.read_xml(CORTEX_XML).unwrap();
    hierarchy
}

#[test]
fn test_outline() {
    init_logging();
    let hierarchy = cortex();
    assert_eq!(hierarchy.find("cortex").unwrap().id(), "688");
    insta::assert_snapshot!(hierarchy.build_tree_model().to_formatted_string(), @r###"
    cortex
      visual
        V1
        V2
      motor
        M1
    cerebellum
    "###);
}

#[test]
fn test_write_xml() {
    let hierarchy = cortex();
    let xml = hierarchy.write_xml_to_string().unwrap();
    assert_eq!(xml.trim_end(), CORTEX_XML.trim_end());
}

#[test]
fn test_write_json() {
    let hierarchy = cortex();
    insta::assert_snapshot!(hierarchy.write_json_to_string().unwrap(), @r###"
    [
      {
        "name": "cortex",
        "id": "688",
        "acronym": "CTX",
        "children": [
          {
            "name": "visual",
            "children": [
              {
                "name": "V1"
              },
              {
                "name": "V2"
              }
            ]
          },
          {
            "name": "motor",
            "children": [
              {
                "name": "M1"
              }
            ]
          }
        ]
      },
      {
        "name": "cerebellum"
      }
    ]
    "###);
}

#[test]
fn test_convert_through_files() {
    let dir = std::env::temp_dir().join(format!("labeltree-formats-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let json_path = dir.join("cortex.json");
    let xml_path = dir.join("cortex.xml");

    let original = cortex();
    original.write_file(&json_path).unwrap();
    let mut from_json = Hierarchy::new();
    from_json.read_file(&json_path).unwrap();
    assert_eq!(from_json, original);

    from_json.write_file(&xml_path).unwrap();
    let mut from_xml = Hierarchy::new();
    from_xml.read_file(&xml_path).unwrap();
    assert_eq!(from_xml, original);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_file_is_an_io_error() {
    let mut hierarchy = cortex();
    let err = hierarchy
        .read_file(&std::env::temp_dir().join("labeltree-does-not-exist.xml"))
        .unwrap_err();
    assert!(err.to_string().starts_with("I/O error: "));
}

#[test]
fn test_add_after_read() {
    let mut hierarchy = cortex();
    assert!(hierarchy.add_item(HierarchyItem::new("V3"), "visual"));
    assert!(!hierarchy.add_item(HierarchyItem::new("V3"), "motor"));
    assert!(!hierarchy.add_item(HierarchyItem::new("S1"), "somatosensory"));
    let visual = hierarchy.find("visual").unwrap();
    let names: Vec<&str> = visual.children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["V1", "V2", "V3"]);
}
