//! # Commands Module
//!
//! Every operation the `colva` binary exposes.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── auth.rs      ◄─── login, logout, register, session restore
//! ├── users.rs     ◄─── list/show/update/delete users (admin)
//! ├── products.rs  ◄─── catalog listing, add, set units, stock check
//! ├── quotation.rs ◄─── selections → draft → atomic save → export
//! └── history.rs   ◄─── history list/details, export, open, watch
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  $ colva quote --select "Sala:1:2" --names Ana ...                      │
//! │         │                                                               │
//! │         │ (clap parse, main.rs)                                         │
//! │         ▼                                                               │
//! │  async fn submit_quotation(                                             │
//! │      backend: &dyn Backend,     ◄── postgres or in-memory              │
//! │      draft: &DraftState,        ◄── filled by apply_selections         │
//! │      session: &SessionState,    ◄── restored from disk                 │
//! │      ...                                                                │
//! │  ) -> Result<QuotationOutcome, SubmitError>                             │
//! │         │                                                               │
//! │         │ (plain text, or JSON with --json)                             │
//! │         ▼                                                               │
//! │  stdout                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the state it needs. Commands never read the
//! session file themselves; the caller passes the signed-in session in.

pub mod auth;
pub mod history;
pub mod products;
pub mod quotation;
pub mod users;
