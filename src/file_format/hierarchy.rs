use std::collections::HashSet;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::errors::{LabelTreeError, Result};

const ROOT_TAG: &str = "CaretHierarchy";
const ITEM_TAG: &str = "Item";
const INFO_TAG: &str = "Info";
const INFO_ITEM_TAG: &str = "InfoItem";
const HIERARCHY_VERSION: &str = "1";

/// Annotation keys that also populate `HierarchyItem::id`.
const ID_KEY: &str = "id";
/// JSON members with structural meaning; never stored as annotations.
const JSON_NAME_KEY: &str = "name";
const JSON_CHILDREN_KEY: &str = "children";

/// Insertion-ordered key/value annotations attached to a hierarchy item.
/// Setting an existing key replaces its value without moving it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InfoStore {
    entries: Vec<(String, String)>,
}

impl InfoStore {
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HierarchyItem {
    name: String,
    id: String,
    children: Vec<HierarchyItem>,
    info: InfoStore,
}

impl HierarchyItem {
    pub fn new(name: &str) -> Self {
        HierarchyItem {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style helper for attaching an annotation before the item is
    /// added to a hierarchy.
    pub fn with_info(mut self, key: &str, value: &str) -> Self {
        self.set_info(key, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn children(&self) -> &[HierarchyItem] {
        &self.children
    }

    pub fn info(&self) -> &InfoStore {
        &self.info
    }

    pub fn set_info(&mut self, key: &str, value: &str) {
        if key == ID_KEY {
            self.id = value.to_string();
        }
        self.info.set(key, value);
    }

    fn clear_info(&mut self) {
        self.info.clear();
        self.id.clear();
    }

    /// Depth-first search for `name`, recording child indices into `path`.
    /// Children are visited last-to-first because files tend to declare a
    /// child right after the most recently added item.
    fn find_path(&self, name: &str, path: &mut Vec<usize>) -> bool {
        if self.name == name {
            return true;
        }
        for (index, child) in self.children.iter().enumerate().rev() {
            path.push(index);
            if child.find_path(name, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    fn descendant(&self, path: &[usize]) -> &HierarchyItem {
        path.iter().fold(self, |item, &index| &item.children[index])
    }

    fn descendant_mut(&mut self, path: &[usize]) -> &mut HierarchyItem {
        path.iter()
            .fold(self, |item, &index| &mut item.children[index])
    }

    fn write_xml<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(ITEM_TAG);
        start.push_attribute(("Name", self.name.as_str()));

        if self.info.is_empty() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if !self.info.is_empty() {
            writer.write_event(Event::Start(BytesStart::new(INFO_TAG)))?;
            for (key, value) in self.info.iter() {
                let mut info_item = BytesStart::new(INFO_ITEM_TAG);
                info_item.push_attribute(("Key", key));
                info_item.push_attribute(("Value", value));
                writer.write_event(Event::Empty(info_item))?;
            }
            writer.write_event(Event::End(BytesEnd::new(INFO_TAG)))?;
        }
        for child in &self.children {
            child.write_xml(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(ITEM_TAG)))?;
        Ok(())
    }

    fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(JSON_NAME_KEY.to_string(), Value::String(self.name.clone()));
        for (key, value) in self.info.iter() {
            if key == JSON_NAME_KEY || key == JSON_CHILDREN_KEY {
                warn!(
                    "dropping annotation '{}' of hierarchy item '{}', the key is reserved in JSON",
                    key, self.name
                );
                continue;
            }
            // Everything is a string by now, the original JSON types are gone.
            obj.insert(key.to_string(), Value::String(value.to_string()));
        }
        if !self.children.is_empty() {
            obj.insert(
                JSON_CHILDREN_KEY.to_string(),
                Value::Array(self.children.iter().map(HierarchyItem::to_json).collect()),
            );
        }
        Value::Object(obj)
    }

    fn to_tree_model_node(&self) -> TreeModelNode {
        TreeModelNode {
            text: self.name.clone(),
            children: self
                .children
                .iter()
                .map(HierarchyItem::to_tree_model_node)
                .collect(),
        }
    }
}

/// Plain display-tree node produced by `Hierarchy::build_tree_model`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeModelNode {
    pub text: String,
    pub children: Vec<TreeModelNode>,
}

/// The top-level nodes of a materialized hierarchy; the implicit root is not
/// part of the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeModel {
    pub roots: Vec<TreeModelNode>,
}

impl TreeModel {
    /// One line per node, children indented two spaces below their parent.
    pub fn to_formatted_string(&self) -> String {
        fn helper(node: &TreeModelNode, depth: usize, lines: &mut Vec<String>) {
            lines.push(format!("{}{}", "  ".repeat(depth), node.text));
            for child in &node.children {
                helper(child, depth + 1, lines);
            }
        }

        let mut lines = Vec::new();
        for node in &self.roots {
            helper(node, 0, &mut lines);
        }
        lines.join("\n")
    }
}

/// An ordered tree of uniquely named items.
///
/// The root item has the empty name and is never serialized; it exists so
/// that top-level items can be added with `""` as their parent name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    root: HierarchyItem,
    used_names: HashSet<String>,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl Hierarchy {
    pub fn new() -> Self {
        let mut used_names = HashSet::new();
        used_names.insert(String::new());
        Hierarchy {
            root: HierarchyItem::default(),
            used_names,
        }
    }

    pub fn clear(&mut self) {
        self.root = HierarchyItem::default();
        self.used_names.clear();
        self.used_names.insert(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// The implicit, unnamed root item.
    pub fn root(&self) -> &HierarchyItem {
        &self.root
    }

    pub fn contains_name(&self, name: &str) -> bool {
        !name.is_empty() && self.used_names.contains(name)
    }

    pub fn find(&self, name: &str) -> Option<&HierarchyItem> {
        if !self.contains_name(name) {
            return None;
        }
        let mut path = Vec::new();
        if self.root.find_path(name, &mut path) {
            Some(self.root.descendant(&path))
        } else {
            None
        }
    }

    /// Append `item` as the last child of the item named `parent`.  Returns
    /// false without modifying anything if the item's name (or the name of
    /// any of its descendants) is already in use, or if there is no item
    /// named `parent`.
    pub fn add_item(&mut self, item: HierarchyItem, parent: &str) -> bool {
        self.add_item_at(item, parent).is_some()
    }

    /// `add_item` returning the child-index path of the newly added item.
    fn add_item_at(&mut self, item: HierarchyItem, parent: &str) -> Option<Vec<usize>> {
        let mut new_names = Vec::new();
        collect_names(&item, &mut new_names);
        {
            let mut seen = HashSet::new();
            for name in &new_names {
                if name.is_empty() || self.used_names.contains(*name) || !seen.insert(*name) {
                    return None;
                }
            }
        }
        // Unknown parents fail without walking the tree.
        if !self.used_names.contains(parent) {
            return None;
        }

        let mut path = Vec::new();
        if !self.root.find_path(parent, &mut path) {
            return None;
        }
        self.used_names
            .extend(new_names.into_iter().map(|name| name.to_string()));
        let parent_item = self.root.descendant_mut(&path);
        parent_item.children.push(item);
        path.push(parent_item.children.len() - 1);
        Some(path)
    }

    pub fn build_tree_model(&self) -> TreeModel {
        TreeModel {
            roots: self
                .root
                .children
                .iter()
                .map(HierarchyItem::to_tree_model_node)
                .collect(),
        }
    }

    /// Read either format, choosing JSON for `.json` files and XML otherwise.
    pub fn read_file(&mut self, path: &Path) -> Result<()> {
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            self.read_json_file(path)
        } else {
            self.read_xml_file(path)
        }
    }

    /// Write either format, choosing JSON for `.json` files and XML otherwise.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            self.write_json_file(path)
        } else {
            self.write_xml_file(path)
        }
    }

    // ## XML

    /// Emit the `CaretHierarchy` element and all items below the root.
    pub fn write_xml<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(ROOT_TAG);
        start.push_attribute(("Version", HIERARCHY_VERSION));
        writer.write_event(Event::Start(start))?;
        for child in &self.root.children {
            child.write_xml(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
        Ok(())
    }

    pub fn write_xml_to_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_xml(&mut writer)?;
        String::from_utf8(writer.into_inner())
            .map_err(|err| LabelTreeError::HierarchyXml(err.to_string()))
    }

    pub fn write_xml_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.write_xml_to_string()?)?;
        Ok(())
    }

    /// Replace the contents of this hierarchy with the parsed XML.  On error
    /// the hierarchy is left empty.
    pub fn read_xml(&mut self, text: &str) -> Result<()> {
        self.clear();
        let result = self.parse_xml(text);
        if result.is_err() {
            self.clear();
        }
        result
    }

    pub fn read_xml_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.read_xml(&text)
    }

    fn parse_xml(&mut self, text: &str) -> Result<()> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut state = XmlReadState {
            parents: vec![String::new()],
            open_items: Vec::new(),
            have_root: false,
            root_ended: false,
            in_info: false,
        };

        loop {
            match reader.read_event()? {
                Event::Start(e) => self.xml_start_element(&e, false, &mut state)?,
                Event::Empty(e) => self.xml_start_element(&e, true, &mut state)?,
                Event::End(e) => match e.name().as_ref() {
                    b"Item" => {
                        state.parents.pop();
                        state.open_items.pop();
                    }
                    b"Info" => state.in_info = false,
                    b"CaretHierarchy" => state.root_ended = true,
                    // Start tags were already validated, and quick-xml
                    // checks that end tags match.
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !state.have_root {
            return Err(LabelTreeError::HierarchyXml(
                "hierarchy XML is missing root element".to_string(),
            ));
        }
        if !state.root_ended {
            return Err(LabelTreeError::HierarchyXml(
                "hierarchy XML ended before the root element was closed".to_string(),
            ));
        }
        Ok(())
    }

    fn xml_start_element(
        &mut self,
        e: &BytesStart,
        is_empty: bool,
        state: &mut XmlReadState,
    ) -> Result<()> {
        let tag = e.name();

        if state.in_info {
            if tag.as_ref() != INFO_ITEM_TAG.as_bytes() {
                return Err(LabelTreeError::HierarchyXml(format!(
                    "found unexpected element in Info context: {}",
                    String::from_utf8_lossy(tag.as_ref())
                )));
            }
            let key = xml_attribute(e, "Key")?.unwrap_or_default();
            let value = xml_attribute(e, "Value")?.unwrap_or_default();
            // in_info implies an open item.
            if let Some(path) = state.open_items.last() {
                self.root.descendant_mut(path).set_info(&key, &value);
            }
            return Ok(());
        }

        match tag.as_ref() {
            b"CaretHierarchy" => {
                if state.have_root {
                    return Err(LabelTreeError::HierarchyXml(format!(
                        "found root '{}' element more than once",
                        ROOT_TAG
                    )));
                }
                state.have_root = true;
                match xml_attribute(e, "Version")? {
                    None => {
                        return Err(LabelTreeError::HierarchyXml(
                            "no Version attribute in hierarchy XML".to_string(),
                        ));
                    }
                    Some(version) if version != HIERARCHY_VERSION => {
                        return Err(LabelTreeError::HierarchyXml(format!(
                            "unknown hierarchy version '{}'",
                            version
                        )));
                    }
                    Some(_) => {}
                }
                if is_empty {
                    state.root_ended = true;
                }
            }
            b"Item" => {
                if !state.have_root {
                    return Err(LabelTreeError::HierarchyXml(
                        "hierarchy XML is missing root element".to_string(),
                    ));
                }
                if state.root_ended {
                    return Err(LabelTreeError::HierarchyXml(
                        "found Item tag after closing root tag in hierarchy XML".to_string(),
                    ));
                }
                let name = xml_attribute(e, "Name")?.unwrap_or_default();
                let parent = state.parents.last().cloned().unwrap_or_default();
                // The item has to exist right away so that its children can
                // find it.
                let path = self
                    .add_item_at(HierarchyItem::new(&name), &parent)
                    .ok_or_else(|| {
                        LabelTreeError::HierarchyXml(format!(
                            "failed to add item '{}' to hierarchy, check for a duplicate, empty, or missing Name attribute",
                            name
                        ))
                    })?;
                if !is_empty {
                    state.parents.push(name);
                    state.open_items.push(path);
                }
            }
            b"Info" => {
                let path = state.open_items.last().ok_or_else(|| {
                    LabelTreeError::HierarchyXml(
                        "Info element not allowed at root level".to_string(),
                    )
                })?;
                // A later Info block replaces an earlier one.
                self.root.descendant_mut(path).clear_info();
                if !is_empty {
                    state.in_info = true;
                }
            }
            other => {
                return Err(LabelTreeError::HierarchyXml(format!(
                    "unexpected element '{}' in hierarchy XML",
                    String::from_utf8_lossy(other)
                )));
            }
        }
        Ok(())
    }

    // ## JSON

    pub fn write_json_to_string(&self) -> Result<String> {
        let items = Value::Array(self.root.children.iter().map(HierarchyItem::to_json).collect());
        Ok(serde_json::to_string_pretty(&items)?)
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.write_json_to_string()?)?;
        Ok(())
    }

    /// Replace the contents of this hierarchy with the parsed JSON, which is
    /// either an array of items or a single item.  On error the hierarchy is
    /// left empty.
    pub fn read_json(&mut self, text: &str) -> Result<()> {
        self.clear();
        let result = serde_json::from_str::<Value>(text)
            .map_err(LabelTreeError::from)
            .and_then(|value| self.add_json_arrayish(&value, ""));
        if result.is_err() {
            self.clear();
        }
        result
    }

    pub fn read_json_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.read_json(&text)
    }

    fn add_json_arrayish(&mut self, elements: &Value, parent: &str) -> Result<()> {
        match elements {
            Value::Array(items) => {
                for item in items {
                    self.add_json_item(item, parent)?;
                }
                Ok(())
            }
            // A lone child is sometimes written without the array, and the
            // top level doesn't have to be an array either.
            other => self.add_json_item(other, parent),
        }
    }

    fn add_json_item(&mut self, value: &Value, parent: &str) -> Result<()> {
        let empty = Map::new();
        let obj = value.as_object().unwrap_or(&empty);

        let name = obj
            .get(JSON_NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if name.is_empty() {
            let context = if parent.is_empty() {
                "in a top-level item".to_string()
            } else {
                format!("in children of '{}'", parent)
            };
            return Err(LabelTreeError::HierarchyJson(format!(
                "empty, non-string, or missing 'name' element in hierarchy json, {}",
                context
            )));
        }

        let mut item = HierarchyItem::new(name);
        for (key, member) in obj {
            if key == JSON_NAME_KEY {
                continue;
            }
            if key == JSON_CHILDREN_KEY {
                if !matches!(member, Value::Array(_) | Value::Object(_)) {
                    warn!(
                        "found non-array value for 'children' member in hierarchy item '{}'",
                        name
                    );
                }
                continue;
            }
            match json_scalar_to_string(member) {
                Some(text) => item.set_info(key, &text),
                None => warn!(
                    "found non-stringlike value for member '{}' in hierarchy item '{}'",
                    key, name
                ),
            }
        }

        if !self.add_item(item, parent) {
            return Err(LabelTreeError::HierarchyJson(format!(
                "failed to add hierarchy item '{}', check whether all 'name's are unique",
                name
            )));
        }

        match obj.get(JSON_CHILDREN_KEY) {
            Some(children @ (Value::Array(_) | Value::Object(_))) => {
                self.add_json_arrayish(children, name)
            }
            _ => Ok(()),
        }
    }
}

struct XmlReadState {
    /// Names of the currently open `Item` elements, seeded with the root's
    /// empty name so top-level items need no special casing.
    parents: Vec<String>,
    /// Child-index paths parallel to `parents` (minus the root), so an
    /// `Info` block can find the item it annotates.
    open_items: Vec<Vec<usize>>,
    have_root: bool,
    root_ended: bool,
    in_info: bool,
}

fn collect_names<'a>(item: &'a HierarchyItem, names: &mut Vec<&'a str>) {
    names.push(&item.name);
    for child in &item.children {
        collect_names(child, names);
    }
}

fn xml_attribute(e: &BytesStart, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn json_scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        // JSON numbers are doubles; 16 significant digits keeps large
        // integer ids intact.
        Value::Number(number) => number.as_f64().map(|n| format_general(n, 16)),
        Value::String(text) => Some(text.clone()),
        _ => None,
    }
}

/// printf-style `%.{precision}g` formatting: fixed notation for moderate
/// exponents, scientific otherwise, trailing zeros removed.
pub fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = precision.max(1);

    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if exponent < -4 || exponent >= precision as i32 {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value))
    }
}

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}
