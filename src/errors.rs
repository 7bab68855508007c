use std::fmt;

pub type Result<T> = std::result::Result<T, LabelTreeError>;

/// Everything that can go wrong while loading or saving hierarchies, label
/// tables, cluster files and tool configuration.
///
/// Soft problems like a non-string JSON annotation are logged rather than
/// turned into one of these; anything here aborts the operation in progress.
#[derive(Debug)]
pub enum LabelTreeError {
    /// The hierarchy XML was malformed or structurally invalid (duplicate
    /// names, unknown elements, unsupported version, ...).
    HierarchyXml(String),
    /// The hierarchy JSON was malformed or an item was missing its name.
    HierarchyJson(String),
    /// The label table JSON could not be understood.
    LabelTable(String),
    /// The cluster JSON could not be understood.
    Clusters(String),
    /// The tool configuration could not be understood.
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for LabelTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelTreeError::HierarchyXml(msg) => write!(f, "Hierarchy XML error: {}", msg),
            LabelTreeError::HierarchyJson(msg) => write!(f, "Hierarchy JSON error: {}", msg),
            LabelTreeError::LabelTable(msg) => write!(f, "Label table error: {}", msg),
            LabelTreeError::Clusters(msg) => write!(f, "Cluster file error: {}", msg),
            LabelTreeError::Config(msg) => write!(f, "Config error: {}", msg),
            LabelTreeError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for LabelTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LabelTreeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

// XML syntax errors only ever come out of hierarchy parsing.
impl From<quick_xml::Error> for LabelTreeError {
    fn from(err: quick_xml::Error) -> LabelTreeError {
        LabelTreeError::HierarchyXml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LabelTreeError {
    fn from(err: quick_xml::events::attributes::AttrError) -> LabelTreeError {
        LabelTreeError::HierarchyXml(err.to_string())
    }
}

// JSON parse errors are hierarchy problems unless a caller re-wraps them.
impl From<serde_json::Error> for LabelTreeError {
    fn from(err: serde_json::Error) -> LabelTreeError {
        LabelTreeError::HierarchyJson(err.to_string())
    }
}

impl From<toml::de::Error> for LabelTreeError {
    fn from(err: toml::de::Error) -> LabelTreeError {
        LabelTreeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for LabelTreeError {
    fn from(err: std::io::Error) -> LabelTreeError {
        LabelTreeError::Io(err)
    }
}
