//! User Interface module for the mock chat.
//!
//! Contains components for rendering and managing the terminal UI:
//! application state, the chat view, the edit panel and its form, gesture
//! recognition, event handling and terminal lifecycle.
mod app;
mod chat_view;
mod event;
mod form;
mod gesture;
mod guard;
pub mod logging;
mod panel;
mod timer;

pub use app::{App, AppMode};
pub use chat_view::{BubbleClass, ChatRow, ChatView, layout_rows};
pub use event::{Event, EventHandler};
pub use form::{Control, FormView};
pub use gesture::{
    CellMetrics, GestureConfig, GestureHandler, GestureIntent, MoveOutcome, Point,
    PressTarget,
};
pub use guard::{TerminalGuard, init_panic_hook, init_tui};
pub use panel::{
    EditPanel, Element, Field, Label, PanelMode, PanelView, SaveOutcome, Toggle,
    parse_count,
};
pub use timer::{Scheduler, TimerEvent, TimerId};
