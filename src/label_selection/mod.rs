pub mod item;
pub mod model;

pub use item::{CheckState, ItemId, ItemKind, ItemType, LabelSelectionItem};
pub use model::{BuildDiagnostics, LabelSelectionModel, SyncDirection, LABEL_TABLE_ONLY_GROUP};
