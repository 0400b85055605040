//! Confirmation dialog bridge.
//!
//! The table does not own a dialog. It registers the dialog configurations
//! its columns declare, asks the bridge to show a row when an icon is
//! activated, and re-fetches once the bridge reports a confirmation.

use std::sync::Mutex;
use std::sync::PoisonError;

use crate::column::DialogConfig;
use crate::model::Record;

/// External confirmation-dialog workflow consumed by the table.
pub trait DialogBridge: Send + Sync {
    /// Registers a dialog configuration. Called once per column that declares one.
    fn configure(&self, config: &DialogConfig);

    /// Returns `true` once the user has confirmed the dialog.
    fn confirmed(&self) -> bool;

    /// Opens the dialog for a row.
    fn show(&self, row: &Record);
}

#[derive(Debug, Default)]
struct DialogInner {
    visible: bool,
    confirmed: bool,
    config: Option<DialogConfig>,
    model: Option<Record>,
}

/// In-process dialog state implementing [`DialogBridge`].
///
/// Holds the visibility flag, the last registered configuration, the row
/// being acted on and the confirmation flag. A later `configure` call
/// replaces the earlier configuration.
///
/// # Example
///
/// ```
/// use tabula_lib::dialog::{DialogBridge, DialogState};
/// use tabula_lib::model::Record;
///
/// let dialog = DialogState::new();
/// dialog.show(&Record::new(3u64));
/// assert!(dialog.is_visible());
///
/// dialog.set_confirmed(true);
/// dialog.hide();
/// assert!(dialog.confirmed());
/// ```
#[derive(Debug, Default)]
pub struct DialogState {
    inner: Mutex<DialogInner>,
}

impl DialogState {
    /// Creates a hidden, unconfirmed dialog.
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut DialogInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Hides the dialog.
    pub fn hide(&self) {
        self.with(|d| d.visible = false);
    }

    /// Returns `true` while the dialog is shown.
    pub fn is_visible(&self) -> bool {
        self.with(|d| d.visible)
    }

    /// Returns the last registered configuration.
    pub fn config(&self) -> Option<DialogConfig> {
        self.with(|d| d.config.clone())
    }

    /// Returns the row the dialog acts on.
    pub fn model(&self) -> Option<Record> {
        self.with(|d| d.model.clone())
    }

    /// Sets the confirmation flag.
    pub fn set_confirmed(&self, confirmed: bool) {
        self.with(|d| d.confirmed = confirmed);
    }
}

impl DialogBridge for DialogState {
    fn configure(&self, config: &DialogConfig) {
        self.with(|d| d.config = Some(config.clone()));
    }

    fn confirmed(&self) -> bool {
        self.with(|d| d.confirmed)
    }

    fn show(&self, row: &Record) {
        self.with(|d| {
            d.model = Some(row.clone());
            d.visible = true;
        });
    }
}
