//! Mock Chat Library
//!
//! A library for building iMessage-style conversation mock-ups in a terminal
//! interface.
//!
//! # Features
//!
//! - In-memory conversation of bubbles and date separators
//! - Edit panel for adding, editing and deleting messages and for the
//!   contact settings
//! - Pointer gestures: swipe to reveal a timestamp, hold to edit, triple
//!   click to add
//! - JSON export of the conversation
//!
//! # Modules
//!
//! - `conversation`: message records, the message store and contact settings
//! - `export`: writing and parsing the export document
//! - `ui`: Terminal user interface components and event handling
pub mod conversation;
pub mod export;
pub mod ui;

pub use conversation::{ContactConfig, Message, MessageKind, MessageStore};
pub use export::{EXPORT_FILE_NAME, Exporter};
pub use ui::logging;
pub use ui::{App, AppMode, Event, EventHandler};
pub use ui::{TerminalGuard, init_panic_hook, init_tui};
