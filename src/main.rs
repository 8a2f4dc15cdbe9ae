use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command, crate_version, value_parser};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};
use mock_chat::logging::{clear_log_file, init_logging, log_file_path};
use mock_chat::ui::{CellMetrics, Control, Field, GestureConfig, parse_count};
use mock_chat::{App, AppMode, ContactConfig, Event, EventHandler, Exporter, MessageStore};
use mock_chat::{TerminalGuard, init_panic_hook, init_tui};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::Stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Rows taken by the header and the status line.
const CHROME_ROWS: u16 = 3;

/// Settings collected from the command line.
struct Options
{
    /// Contact name, blank for the default
    contact: String,
    /// Badge count
    notifications: u32,
    /// Export directory, `None` for the download directory
    export_dir: Option<PathBuf>,
    /// Cell size in gesture units
    metrics: CellMetrics,
    /// Remove the log file and exit
    clear_log: bool,
}

impl Options
{
    /// Parses the command line.
    fn parse() -> Self
    {
        let log_help = log_file_path().map_or_else(
            |_| String::from("Logs are written to the user cache directory."),
            |path| format!("Logs are written to {}", path.display()),
        );

        let defaults = CellMetrics::default();

        let matches = Command::new("mock_chat")
            .version(crate_version!())
            .about("A terminal mock-up of an iMessage conversation")
            .after_help(log_help)
            .arg(
                Arg::new("contact")
                    .long("contact")
                    .short('c')
                    .value_name("NAME")
                    .help("Contact name shown in the header"),
            )
            .arg(
                Arg::new("notifications")
                    .long("notifications")
                    .short('n')
                    .value_name("N")
                    .help("Unread count shown in the badge (0 hides it)"),
            )
            .arg(
                Arg::new("export-dir")
                    .long("export-dir")
                    .value_name("DIR")
                    .value_parser(value_parser!(PathBuf))
                    .help("Directory the JSON export is written to"),
            )
            .arg(
                Arg::new("cell-width")
                    .long("cell-width")
                    .value_name("UNITS")
                    .value_parser(value_parser!(u16).range(1..))
                    .help("Width of a terminal cell in gesture units"),
            )
            .arg(
                Arg::new("cell-height")
                    .long("cell-height")
                    .value_name("UNITS")
                    .value_parser(value_parser!(u16).range(1..))
                    .help("Height of a terminal cell in gesture units"),
            )
            .arg(
                Arg::new("clear-log")
                    .long("clear-log")
                    .help("Remove the log file and exit")
                    .action(ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            contact: matches
                .get_one::<String>("contact")
                .cloned()
                .unwrap_or_default(),
            // Same lenient parse as the settings form
            notifications: matches
                .get_one::<String>("notifications")
                .map_or(0, |count| parse_count(count)),
            export_dir: matches.get_one::<PathBuf>("export-dir").cloned(),
            metrics: CellMetrics {
                width: matches
                    .get_one::<u16>("cell-width")
                    .copied()
                    .unwrap_or(defaults.width),
                height: matches
                    .get_one::<u16>("cell-height")
                    .copied()
                    .unwrap_or(defaults.height),
            },
            clear_log: matches.get_flag("clear-log"),
        }
    }
}

fn main() -> Result<()>
{
    let options = Options::parse();

    if options.clear_log
    {
        clear_log_file()?;
        println!("Log file removed");
        return Ok(());
    }

    // A missing log file is no reason to refuse to start
    if let Err(err) = init_logging()
    {
        eprintln!("Logging disabled: {err:#}");
    }

    init_panic_hook();

    let exporter = match options.export_dir
    {
        Some(dir) => Exporter::new(dir),
        None => Exporter::with_default_dir().context("No export directory available")?,
    };
    info!("Exports go to {}", exporter.export_dir().display());

    let app = App::new(
        MessageStore::sample(),
        ContactConfig::new(&options.contact, options.notifications),
        exporter,
        GestureConfig::default(),
        options.metrics,
    );

    // Use RAII to ensure terminal cleanup happens
    let _terminal_guard = TerminalGuard::new()?;

    let mut terminal = init_tui()?;

    // Ticks fire the gesture timers; keep them well under the tap window
    let event_handler = EventHandler::new(Duration::from_millis(50));

    // Terminal will be cleaned up automatically when _terminal_guard is dropped
    run_app(&mut terminal, app, &event_handler)
}

/// Whether the key is the export shortcut, Ctrl+E or Cmd+E.
fn is_export_shortcut(key: &KeyEvent) -> bool
{
    key.code == KeyCode::Char('e') &&
        key.modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
}

/// Whether the key types text, that is no Ctrl, Alt or Cmd is held.
fn is_plain_char(key: &KeyEvent) -> bool
{
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// Run the main loop
///
/// # Arguments
///
/// * `terminal` - The terminal to draw to
/// * `app` - The app to run
/// * `event_handler` - The event handler to handle events
///
/// # Errors
///
/// Returns an error if the terminal fails to draw to the screen.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    event_handler: &EventHandler,
) -> Result<()>
{
    loop
    {
        // Redraw before blocking on the next event
        terminal.draw(|frame| app.render(frame))?;

        let key = match event_handler.next()?
        {
            // Fire due long-press, tap-window and hide timers
            Event::Tick =>
            {
                app.tick(Instant::now());
                continue;
            }
            // The mouse stands in for touch
            Event::Mouse(mouse) =>
            {
                app.handle_mouse(Instant::now(), mouse);
                continue;
            }
            // Keep the newest message in view
            Event::Resize(..) =>
            {
                app.on_resize();
                continue;
            }
            Event::Key(key) => key,
        };

        // Windows reports releases too
        if key.kind != KeyEventKind::Press
        {
            continue;
        }

        // Export works everywhere, even with the panel open
        if is_export_shortcut(&key)
        {
            app.export();
            continue;
        }

        // One page is the chat height without header and status line
        let page = usize::from(
            terminal
                .size()?
                .height
                .saturating_sub(CHROME_ROWS),
        );

        match (app.mode(), key.code)
        {
            // Quit with 'q' in chat mode
            (AppMode::Chat, KeyCode::Char('q')) =>
            {
                app.should_quit = true;
            }

            // Help toggle with '?'
            (AppMode::Chat | AppMode::Help, KeyCode::Char('?')) |
            (AppMode::Help, KeyCode::Esc) =>
            {
                app.toggle_help();
            }

            // Actions in chat mode
            (AppMode::Chat, KeyCode::Char('x')) =>
            {
                app.export();
            }
            (AppMode::Chat, KeyCode::Char('a')) =>
            {
                app.compose();
            }
            (AppMode::Chat, KeyCode::Char('e')) =>
            {
                if !app.edit_newest()
                {
                    warn!("Nothing to edit");
                }
            }

            // Navigation in chat mode
            (AppMode::Chat, KeyCode::Char('j') | KeyCode::Down) =>
            {
                app.scroll_down(1);
            }
            (AppMode::Chat, KeyCode::Char('k') | KeyCode::Up) =>
            {
                app.scroll_up(1);
            }
            (AppMode::Chat, KeyCode::PageDown) =>
            {
                app.scroll_down(page);
            }
            (AppMode::Chat, KeyCode::PageUp) =>
            {
                app.scroll_up(page);
            }
            (AppMode::Chat, KeyCode::Char('g')) =>
            {
                app.scroll_to_top();
            }
            (AppMode::Chat, KeyCode::Char('G')) =>
            {
                app.scroll_to_bottom();
            }
            // Dismiss the status message
            (AppMode::Chat, KeyCode::Esc) =>
            {
                app.status = None;
            }

            // Edit panel: Esc drops unsaved input
            (AppMode::Panel, KeyCode::Esc) =>
            {
                app.close_panel();
            }
            // Focus movement
            (AppMode::Panel, KeyCode::Tab | KeyCode::Down) =>
            {
                app.form_mut().focus_next();
            }
            (AppMode::Panel, KeyCode::BackTab | KeyCode::Up) =>
            {
                app.form_mut().focus_prev();
            }
            // Arrows flip the sender when it has focus
            (AppMode::Panel, KeyCode::Left | KeyCode::Right)
                if app.form().focused() == Some(Control::Input(Field::Sender)) =>
            {
                app.form_mut().flip_sender();
            }
            // Save, or press the focused button
            (AppMode::Panel, KeyCode::Enter) =>
            {
                app.activate_focused();
            }
            // Text editing
            (AppMode::Panel, KeyCode::Backspace) =>
            {
                app.form_mut().delete_char();
            }
            (AppMode::Panel, KeyCode::Char(' ')) =>
            {
                app.form_mut().press_space();
            }
            // Shortcut chords are not text
            (AppMode::Panel, KeyCode::Char(ch)) if is_plain_char(&key) =>
            {
                app.form_mut().input_char(ch);
            }

            _ =>
            {} // Ignore other key combinations
        }

        if app.should_quit
        {
            break;
        }
    }

    Ok(())
}
