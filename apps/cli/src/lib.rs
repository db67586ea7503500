//! # Colva CLI Library
//!
//! Everything the `colva` binary does, as a library so the integration
//! tests can drive the same commands against an in-memory backend.
//!
//! ## Module Organization
//! ```text
//! colva_cli_lib/
//! ├── lib.rs          ◄─── You are here (logging setup)
//! ├── config.rs       ◄─── AppConfig (file → env → validate)
//! ├── print.rs        ◄─── PrintService (document hand-off)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── session.rs  ◄─── Signed-in user + on-disk snapshot
//! │   ├── draft.rs    ◄─── Quotation draft behind Arc<Mutex>
//! │   └── export.rs   ◄─── Last generated document
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── auth.rs     ◄─── Login, logout, registration
//! │   ├── users.rs    ◄─── User administration (admin only)
//! │   ├── products.rs ◄─── Catalog listing and stock
//! │   ├── quotation.rs◄─── Draft building and submission
//! │   └── history.rs  ◄─── History, details, export, polling
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management (Multiple State Types)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command State                                        │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐     │
//! │  │  &dyn Backend    │ │  SessionState    │ │  DraftState          │     │
//! │  │                  │ │                  │ │                      │     │
//! │  │  • PostgreSQL    │ │  • user profile  │ │  • environments      │     │
//! │  │  • or in-memory  │ │  • signed-in at  │ │  • selections        │     │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘     │
//! │                                                                         │
//! │  Each command takes only the state it needs.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod print;
pub mod state;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=colva_db=trace` - Trace the data layer only
/// - Default: INFO, debug for colva crates, warnings only from sqlx
///
/// Logs go to stderr so command output on stdout stays clean for `--json`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,colva=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
