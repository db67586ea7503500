//! # Draft State
//!
//! The quotation being assembled, before anything is persisted.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action                 Command                    Draft change         │
//! │  ──────                 ───────                    ────────────         │
//! │  --select ENV:ID:QTY ─► apply_selections() ──────► set_quantity(...)    │
//! │  new environment ─────► add_named_environment() ─► environments.push    │
//! │  submit ──────────────► submit_quotation() ──────► (read) then clear    │
//! │                                                                         │
//! │  NOTE: every write holds the Mutex for the whole draft operation, so    │
//! │        the per-product stock sum is checked against a stable draft.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use colva_core::QuotationDraft;

/// Shared handle to the current draft.
#[derive(Debug, Clone, Default)]
pub struct DraftState {
    draft: Arc<Mutex<QuotationDraft>>,
}

impl DraftState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the draft.
    ///
    /// ```rust,ignore
    /// let empty = draft_state.with_draft(|d| d.is_empty());
    /// ```
    pub fn with_draft<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&QuotationDraft) -> R,
    {
        // QuotationDraft methods validate before mutating; a poisoned draft is still whole.
        let draft = self.draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&draft)
    }

    /// Executes a function with write access to the draft.
    ///
    /// ```rust,ignore
    /// draft_state.with_draft_mut(|d| d.set_quantity("Ambiente 1", &lamp, 6))?;
    /// ```
    pub fn with_draft_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut QuotationDraft) -> R,
    {
        let mut draft = self.draft.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut draft)
    }

    /// Copy of the current draft.
    pub fn snapshot(&self) -> QuotationDraft {
        self.with_draft(|d| d.clone())
    }

    pub fn clear(&self) {
        self.with_draft_mut(|d| d.clear());
    }
}
