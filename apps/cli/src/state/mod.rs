//! # State Module
//!
//! Separate state types, each command taking only what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐       │
//! │  │  SessionState    │  │   DraftState     │  │   ExportState    │       │
//! │  │                  │  │                  │  │                  │       │
//! │  │  UserProfile     │  │  Arc<Mutex<      │  │  Arc<Mutex<      │       │
//! │  │  signed_in_at    │  │   QuotationDraft │  │   Option<Path>   │       │
//! │  │                  │  │  >>              │  │  >>              │       │
//! │  └────────┬─────────┘  └──────────────────┘  └──────────────────┘       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  SessionStore: session.json (no password material)                      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                         │
//! │  • SessionState: immutable once signed in                               │
//! │  • DraftState / ExportState: Arc<Mutex<T>> for exclusive access         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod draft;
mod export;
mod session;

pub use draft::DraftState;
pub use export::ExportState;
pub use session::{SessionState, SessionStore};
