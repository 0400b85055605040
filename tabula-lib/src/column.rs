//! Column schema
//!
//! A [`ColumnSchema`] is the ordered, validated list of [`Column`]s a table
//! displays. Each column has a dotted key, a header label, and a kind:
//!
//! - [`ColumnKind::Text`] shows the resolved field value, optionally as a
//!   navigation link to `target`.
//! - [`ColumnKind::Icon`] shows an icon that triggers a row action. Icon
//!   columns carry no server-addressable field and are never projected.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::dialog::DialogBridge;
use crate::error::ConfigError;
use crate::model::FieldPath;
use crate::model::Record;

// =============================================================================
// Column
// =============================================================================

/// Opaque configuration handed to the dialog bridge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogConfig(pub serde_json::Value);

impl DialogConfig {
    /// Wraps an arbitrary JSON configuration.
    pub fn new(config: serde_json::Value) -> Self {
        Self(config)
    }

    /// Returns the wrapped configuration.
    pub fn value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Callback invoked with the row an icon was activated on.
#[derive(Clone)]
pub struct RowAction(Arc<dyn Fn(&Record) + Send + Sync>);

impl RowAction {
    /// Wraps a callback.
    pub fn new(f: impl Fn(&Record) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, row: &Record) {
        (self.0)(row)
    }
}

impl fmt::Debug for RowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowAction(..)")
    }
}

/// Display kind of a column.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    /// Field value as text.
    Text {
        /// Navigation path the cell links to.
        target: Option<String>,
    },
    /// Clickable icon.
    Icon {
        /// Icon name.
        icon: String,
        /// Action run on click. Takes precedence over the column's dialog.
        on_click: Option<RowAction>,
    },
}

/// What activating an icon cell did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// The column's own `on_click` ran.
    Callback,
    /// The dialog bridge was asked to show the row.
    Dialog,
    /// The column is not an icon.
    Inert,
}

/// A table column definition.
#[derive(Debug, Clone)]
pub struct Column {
    /// Dotted key of the field this column shows.
    pub key: String,
    /// Header text.
    pub label: String,
    /// Display kind.
    pub kind: ColumnKind,
    /// Dialog configuration registered with the bridge at setup.
    pub dialog: Option<DialogConfig>,
}

impl Column {
    /// Creates a text column.
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ColumnKind::Text { target: None },
            dialog: None,
        }
    }

    /// Creates an icon column.
    pub fn icon(key: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind: ColumnKind::Icon {
                icon: icon.into(),
                on_click: None,
            },
            dialog: None,
        }
    }

    /// Makes a text column link to `target`. No effect on icon columns.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        if let ColumnKind::Text { target: slot } = &mut self.kind {
            *slot = Some(target.into());
        }
        self
    }

    /// Sets the click action of an icon column. No effect on text columns.
    pub fn with_on_click(mut self, f: impl Fn(&Record) + Send + Sync + 'static) -> Self {
        if let ColumnKind::Icon { on_click, .. } = &mut self.kind {
            *on_click = Some(RowAction::new(f));
        }
        self
    }

    /// Attaches a dialog configuration.
    pub fn with_dialog(mut self, config: DialogConfig) -> Self {
        self.dialog = Some(config);
        self
    }

    /// Returns `true` for icon columns.
    pub fn is_icon(&self) -> bool {
        matches!(self.kind, ColumnKind::Icon { .. })
    }

    /// Returns the navigation target of a text column.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::Text { target } => target.as_deref(),
            ColumnKind::Icon { .. } => None,
        }
    }

    /// Runs the row action of an icon column.
    ///
    /// The column's `on_click` wins; otherwise the bridge is asked to show
    /// the row. Exactly one of the two runs. Text columns are inert.
    pub fn activate(&self, row: &Record, dialog: &dyn DialogBridge) -> Activation {
        match &self.kind {
            ColumnKind::Icon {
                on_click: Some(action),
                ..
            } => {
                action.call(row);
                Activation::Callback
            }
            ColumnKind::Icon { on_click: None, .. } => {
                dialog.show(row);
                Activation::Dialog
            }
            ColumnKind::Text { .. } => Activation::Inert,
        }
    }
}

// =============================================================================
// ColumnSchema
// =============================================================================

/// Ordered, validated column definitions.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    paths: Vec<FieldPath>,
}

impl ColumnSchema {
    /// Validates a list of columns.
    ///
    /// Fails if the list is empty, a key is not a valid field path, or two
    /// columns share a key.
    pub fn new(columns: Vec<Column>) -> Result<Self, ConfigError> {
        if columns.is_empty() {
            return Err(ConfigError::MissingColumns);
        }

        let mut seen = HashSet::with_capacity(columns.len());
        let mut paths = Vec::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ConfigError::duplicate_column(&column.key));
            }
            paths.push(FieldPath::parse(column.key.as_str())?);
        }

        Ok(Self { columns, paths })
    }

    /// Returns the columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Iterates columns together with their parsed key paths.
    pub fn iter(&self) -> impl Iterator<Item = (&Column, &FieldPath)> {
        self.columns.iter().zip(self.paths.iter())
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; a schema has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Finds a column by key.
    pub fn find(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Column keys sent to a remote fetch, in display order.
    ///
    /// Icon columns are excluded.
    pub fn projected_fields(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.is_icon())
            .map(|c| c.key.clone())
            .collect()
    }

    /// Dialog configurations declared by the columns, in display order.
    pub fn dialog_configs(&self) -> impl Iterator<Item = &DialogConfig> {
        self.columns.iter().filter_map(|c| c.dialog.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dialog::DialogState;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            Column::text("name", "Name").with_target("/customers/detail"),
            Column::text("address.city", "City"),
            Column::icon("delete", "", "trash").with_dialog(DialogConfig::default()),
        ])
        .unwrap()
    }

    #[test]
    fn test_projected_fields_skip_icons() {
        assert_eq!(schema().projected_fields(), vec!["name", "address.city"]);
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert_eq!(
            ColumnSchema::new(Vec::new()).unwrap_err(),
            ConfigError::MissingColumns
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = ColumnSchema::new(vec![Column::text("name", "A"), Column::text("name", "B")])
            .unwrap_err();
        assert_eq!(err, ConfigError::duplicate_column("name"));
    }

    #[test]
    fn test_invalid_path_rejected() {
        let err = ColumnSchema::new(vec![Column::text("address..city", "City")]).unwrap_err();
        assert_eq!(err, ConfigError::invalid_field_path("address..city"));
    }

    #[test]
    fn test_target_only_on_text() {
        let icon = Column::icon("edit", "", "pencil").with_target("/edit");
        assert_eq!(icon.target(), None);
        let text = Column::text("name", "Name").with_target("/detail");
        assert_eq!(text.target(), Some("/detail"));
    }

    #[test]
    fn test_on_click_takes_precedence_over_dialog() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();
        let column = Column::icon("delete", "", "trash")
            .with_dialog(DialogConfig::default())
            .with_on_click(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let dialog = DialogState::new();

        let row = Record::new(1u64);
        assert_eq!(column.activate(&row, &dialog), Activation::Callback);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert!(!dialog.is_visible());
    }

    #[test]
    fn test_dialog_shown_without_on_click() {
        let column = Column::icon("delete", "", "trash").with_dialog(DialogConfig::default());
        let dialog = DialogState::new();

        let row = Record::new(9u64).set("name", "Ada");
        assert_eq!(column.activate(&row, &dialog), Activation::Dialog);
        assert!(dialog.is_visible());
        assert_eq!(dialog.model(), Some(row));
    }

    #[test]
    fn test_dialog_shown_without_config() {
        let column = Column::icon("archive", "", "box");
        let dialog = DialogState::new();
        assert_eq!(column.activate(&Record::new(2u64), &dialog), Activation::Dialog);
        assert!(dialog.is_visible());
    }

    #[test]
    fn test_text_column_is_inert() {
        let dialog = DialogState::new();
        let column = Column::text("name", "Name").with_dialog(DialogConfig::default());
        assert_eq!(column.activate(&Record::new(1u64), &dialog), Activation::Inert);
    }
}
