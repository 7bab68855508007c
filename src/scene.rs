use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A saved snapshot of one object's state: a named, versioned bag of string
/// arrays.  Scenes are persisted as JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneClass {
    pub name: String,
    pub class_name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_arrays: BTreeMap<String, Vec<String>>,
}

impl SceneClass {
    pub fn new(name: &str, class_name: &str, version: u32) -> Self {
        SceneClass {
            name: name.to_string(),
            class_name: class_name.to_string(),
            version,
            string_arrays: BTreeMap::new(),
        }
    }

    pub fn add_string_array(&mut self, name: &str, values: Vec<String>) {
        self.string_arrays.insert(name.to_string(), values);
    }

    pub fn string_array(&self, name: &str) -> Option<&[String]> {
        self.string_arrays.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut scene = SceneClass::new("labels", "LabelSelectionItemModel", 1);
        assert_eq!(
            serde_json::to_value(&scene).unwrap(),
            serde_json::json!({
                "name": "labels",
                "class_name": "LabelSelectionItemModel",
                "version": 1,
            })
        );

        scene.add_string_array("CheckedLabels", vec!["V1".to_string()]);
        let reread: SceneClass =
            serde_json::from_str(&serde_json::to_string(&scene).unwrap()).unwrap();
        assert_eq!(reread.string_array("CheckedLabels"), Some(&["V1".to_string()][..]));
    }
}
