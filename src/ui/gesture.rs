//! Pointer gesture recognition.
//!
//! Turns press / drag / release sequences into editing intents:
//!
//! - a horizontal swipe over a bubble reveals its timestamp,
//! - holding a press over a bubble opens it for editing,
//! - three quick taps anywhere open the compose panel.
//!
//! All timing goes through a [`Scheduler`], so every method takes the
//! current instant instead of reading the clock.
use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, trace};

use super::timer::{Scheduler, TimerEvent, TimerId};

/// Taps needed to open the compose panel.
const COMPOSE_TAPS: u8 = 3;

/// Position in gesture units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point
{
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
}

impl Point
{
    /// Creates a point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self
    {
        Self { x, y }
    }
}

/// Size of one terminal cell in gesture units.
///
/// Terminal cells are roughly twice as tall as they are wide, so the default
/// keeps distances comparable in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics
{
    /// Units per column
    pub width: u16,
    /// Units per row
    pub height: u16,
}

impl CellMetrics
{
    /// Converts a terminal cell position into gesture units.
    #[must_use]
    pub fn to_point(self, column: u16, row: u16) -> Point
    {
        Point::new(
            i32::from(column) * i32::from(self.width),
            i32::from(row) * i32::from(self.height),
        )
    }
}

impl Default for CellMetrics
{
    fn default() -> Self
    {
        Self {
            width: 8,
            height: 16,
        }
    }
}

/// Thresholds and durations of the recognizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureConfig
{
    /// Horizontal travel that reveals a timestamp (exclusive)
    pub reveal_distance: i32,
    /// Horizontal travel after which page scrolling is suppressed (exclusive)
    pub scroll_lock_distance: i32,
    /// How long a press must be held to open the editor
    pub long_press: Duration,
    /// Window in which taps count towards the compose gesture
    pub tap_window: Duration,
    /// How long a revealed timestamp stays visible after release
    pub reveal_duration: Duration,
}

impl Default for GestureConfig
{
    fn default() -> Self
    {
        Self {
            reveal_distance: 30,
            scroll_lock_distance: 10,
            long_press: Duration::from_millis(500),
            tap_window: Duration::from_millis(500),
            reveal_duration: Duration::from_millis(2500),
        }
    }
}

/// What the application should do in response to a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIntent
{
    /// Open the edit panel for the given bubble ordinal
    Edit
    {
        /// Ordinal of the bubble among non-date records
        bubble: usize,
    },
    /// Open the edit panel for a new message
    Compose,
    /// Hide the timestamp of the given bubble
    HideTimestamp
    {
        /// Ordinal of the bubble among non-date records
        bubble: usize,
    },
}

/// Result of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome
{
    /// The interaction was classified as a vertical scroll
    pub scrolling: bool,
    /// Page scrolling should be suppressed for this move
    pub suppress_scroll: bool,
    /// Bubble whose timestamp should be revealed
    pub reveal: Option<usize>,
}

/// Where a press landed.
///
/// A swipe may start anywhere on a bubble's rows, a long press only on the
/// bubble itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PressTarget
{
    /// Bubble owning the pressed row
    pub row: Option<usize>,
    /// Bubble whose body was pressed
    pub body: Option<usize>,
}

impl PressTarget
{
    /// A press on the body of `bubble`.
    #[must_use]
    pub const fn body(bubble: usize) -> Self
    {
        Self {
            row: Some(bubble),
            body: Some(bubble),
        }
    }

    /// A press beside `bubble`, on one of its rows.
    #[must_use]
    pub const fn row(bubble: usize) -> Self
    {
        Self {
            row: Some(bubble),
            body: None,
        }
    }
}

/// Swipe being tracked between press and release.
#[derive(Debug, Clone, Copy)]
struct Swipe
{
    /// Where the press started
    start: Point,
    /// Bubble under the press
    bubble: usize,
    /// Set once a move was more vertical than horizontal
    scrolling: bool,
    /// Set once the swipe revealed the timestamp
    revealed: bool,
}

/// Recognizes swipe, long-press and triple-tap gestures.
#[derive(Debug)]
pub struct GestureHandler
{
    /// Thresholds and durations
    config: GestureConfig,
    /// Pending gesture timers
    scheduler: Scheduler,
    /// Active swipe, if the press started over a bubble
    swipe: Option<Swipe>,
    /// Armed long-press timer
    long_press: Option<TimerId>,
    /// Taps seen in the current window
    taps: u8,
    /// Timer closing the current tap window
    tap_window: Option<TimerId>,
    /// Pending hide timer per revealed bubble
    hide_timers: HashMap<usize, TimerId>,
}

impl GestureHandler
{
    /// Creates a handler with the given configuration.
    #[must_use]
    pub fn new(config: GestureConfig) -> Self
    {
        Self {
            config,
            scheduler: Scheduler::new(),
            swipe: None,
            long_press: None,
            taps: 0,
            tap_window: None,
            hide_timers: HashMap::new(),
        }
    }

    /// Starts an interaction.
    ///
    /// # Arguments
    ///
    /// * `now` - Current instant
    /// * `point` - Press position in gesture units
    /// * `target` - Bubble rows and body under the press
    pub fn touch_start(&mut self, now: Instant, point: Point, target: PressTarget)
    {
        self.swipe = target.row.map(|bubble| Swipe {
            start: point,
            bubble,
            scrolling: false,
            revealed: false,
        });

        if let Some(bubble) = target.body
        {
            self.cancel_long_press();
            self.long_press = Some(self.scheduler.schedule(
                now,
                self.config.long_press,
                TimerEvent::LongPress { bubble },
            ));
            trace!("Long press armed on bubble {bubble}");
        }
    }

    /// Tracks pointer movement.
    ///
    /// Any movement cancels a pending long press.
    pub fn touch_move(&mut self, point: Point) -> MoveOutcome
    {
        self.cancel_long_press();

        let Some(swipe) = self.swipe.as_mut()
        else
        {
            return MoveOutcome::default();
        };

        let diff_x = swipe.start.x.saturating_sub(point.x).saturating_abs();
        let diff_y = swipe.start.y.saturating_sub(point.y).saturating_abs();

        if diff_y > diff_x
        {
            swipe.scrolling = true;
            return MoveOutcome {
                scrolling: true,
                ..MoveOutcome::default()
            };
        }

        let reveal = (diff_x > self.config.reveal_distance && !swipe.scrolling)
            .then_some(swipe.bubble);

        if let Some(bubble) = reveal
        {
            swipe.revealed = true;
            debug!("Swipe of {diff_x} units reveals bubble {bubble}");
        }

        let outcome = MoveOutcome {
            scrolling: swipe.scrolling,
            suppress_scroll: diff_x > self.config.scroll_lock_distance,
            reveal,
        };

        // an older release must not hide this reveal
        if let Some(bubble) = reveal &&
            let Some(timer) = self.hide_timers.remove(&bubble)
        {
            self.scheduler.cancel(timer);
        }

        outcome
    }

    /// Ends an interaction.
    ///
    /// Every release counts as a tap. A bubble whose timestamp this swipe
    /// revealed gets it hidden again after the reveal duration, replacing
    /// any hide still pending for it.
    ///
    /// # Returns
    ///
    /// `Compose` when this release completes a triple tap.
    pub fn touch_end(&mut self, now: Instant) -> Option<GestureIntent>
    {
        self.cancel_long_press();

        if let Some(swipe) = self.swipe.take() &&
            swipe.revealed
        {
            let timer = self.scheduler.schedule(
                now,
                self.config.reveal_duration,
                TimerEvent::HideTimestamp {
                    bubble: swipe.bubble,
                },
            );

            if let Some(stale) = self.hide_timers.insert(swipe.bubble, timer)
            {
                self.scheduler.cancel(stale);
            }
        }

        self.tap(now)
    }

    /// Fires due timers.
    ///
    /// # Returns
    ///
    /// The intents produced by expired timers, earliest first.
    pub fn tick(&mut self, now: Instant) -> Vec<GestureIntent>
    {
        self.scheduler
            .fire_due(now)
            .into_iter()
            .filter_map(|event| match event
            {
                TimerEvent::TapWindowClosed =>
                {
                    self.taps = 0;
                    self.tap_window = None;
                    None
                }
                TimerEvent::LongPress { bubble } =>
                {
                    self.long_press = None;
                    debug!("Long press on bubble {bubble}");
                    Some(GestureIntent::Edit { bubble })
                }
                TimerEvent::HideTimestamp { bubble } =>
                {
                    self.hide_timers.remove(&bubble);
                    Some(GestureIntent::HideTimestamp { bubble })
                }
            })
            .collect()
    }

    /// Taps counted in the current window.
    #[must_use]
    pub const fn tap_count(&self) -> u8
    {
        self.taps
    }

    /// Whether a long press is armed.
    #[must_use]
    pub const fn long_press_pending(&self) -> bool
    {
        self.long_press.is_some()
    }

    /// Whether a press is being tracked as a swipe.
    #[must_use]
    pub const fn is_tracking(&self) -> bool
    {
        self.swipe.is_some()
    }

    /// Counts a tap.
    fn tap(&mut self, now: Instant) -> Option<GestureIntent>
    {
        self.taps = self.taps.saturating_add(1);

        if self.taps == 1
        {
            self.tap_window = Some(self.scheduler.schedule(
                now,
                self.config.tap_window,
                TimerEvent::TapWindowClosed,
            ));
        }
        else if self.taps >= COMPOSE_TAPS
        {
            if let Some(window) = self.tap_window.take()
            {
                self.scheduler.cancel(window);
            }
            self.taps = 0;
            debug!("Triple tap");
            return Some(GestureIntent::Compose);
        }

        None
    }

    /// Disarms the long-press timer.
    fn cancel_long_press(&mut self)
    {
        if let Some(timer) = self.long_press.take()
        {
            self.scheduler.cancel(timer);
        }
    }
}

impl Default for GestureHandler
{
    fn default() -> Self
    {
        Self::new(GestureConfig::default())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn millis(start: Instant, millis: u64) -> Instant
    {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn swipe_reveals_only_past_threshold()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(100, 50), PressTarget::body(1));
        let outcome = gestures.touch_move(Point::new(70, 50));
        assert_eq!(outcome.reveal, None);
        assert!(outcome.suppress_scroll);

        let outcome = gestures.touch_move(Point::new(69, 50));
        assert_eq!(outcome.reveal, Some(1));

        gestures.touch_start(start, Point::new(100, 50), PressTarget::body(2));
        let outcome = gestures.touch_move(Point::new(131, 52));
        assert_eq!(outcome.reveal, Some(2));
    }

    #[test]
    fn small_moves_do_not_suppress_scroll()
    {
        let mut gestures = GestureHandler::default();
        gestures.touch_start(Instant::now(), Point::new(0, 0), PressTarget::body(0));

        assert_eq!(gestures.touch_move(Point::new(10, 0)), MoveOutcome::default());
    }

    #[test]
    fn vertical_move_sticks_as_scroll()
    {
        let mut gestures = GestureHandler::default();
        gestures.touch_start(Instant::now(), Point::new(0, 0), PressTarget::body(0));

        let outcome = gestures.touch_move(Point::new(5, 40));
        assert!(outcome.scrolling);
        assert_eq!(outcome.reveal, None);

        let outcome = gestures.touch_move(Point::new(80, 40));
        assert!(outcome.scrolling);
        assert!(outcome.suppress_scroll);
        assert_eq!(outcome.reveal, None);
    }

    #[test]
    fn move_without_bubble_is_ignored()
    {
        let mut gestures = GestureHandler::default();
        gestures.touch_start(Instant::now(), Point::new(0, 0), PressTarget::default());

        assert!(!gestures.is_tracking());
        assert_eq!(gestures.touch_move(Point::new(100, 0)), MoveOutcome::default());
    }

    #[test]
    fn release_hides_timestamp_after_reveal_duration()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(100, 0), PressTarget::body(3));
        gestures.touch_move(Point::new(40, 0));
        gestures.touch_end(millis(start, 100));

        assert!(gestures.tick(millis(start, 2599)).is_empty());
        assert_eq!(
            gestures.tick(millis(start, 2600)),
            vec![GestureIntent::HideTimestamp { bubble: 3 }]
        );
    }

    #[test]
    fn click_without_reveal_schedules_no_hide()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(10, 10), PressTarget::body(0));
        gestures.touch_end(millis(start, 100));

        assert!(!gestures
            .tick(millis(start, 5000))
            .contains(&GestureIntent::HideTimestamp { bubble: 0 }));
    }

    #[test]
    fn earlier_click_does_not_cut_later_reveal_short()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(100, 0), PressTarget::body(0));
        gestures.touch_end(start);
        gestures.tick(millis(start, 600));

        gestures.touch_start(millis(start, 2000), Point::new(100, 0), PressTarget::body(0));
        gestures.touch_move(Point::new(20, 0));
        gestures.touch_end(millis(start, 2000));

        assert!(gestures.tick(millis(start, 2500)).is_empty());
        assert!(gestures.tick(millis(start, 4499)).is_empty());
        assert_eq!(
            gestures.tick(millis(start, 4500)),
            vec![GestureIntent::HideTimestamp { bubble: 0 }]
        );
    }

    #[test]
    fn new_reveal_replaces_pending_hide()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(100, 0), PressTarget::body(1));
        gestures.touch_move(Point::new(20, 0));
        gestures.touch_end(start);

        gestures.touch_start(millis(start, 1000), Point::new(100, 0), PressTarget::body(1));
        gestures.touch_move(Point::new(20, 0));
        gestures.touch_end(millis(start, 1000));

        assert!(!gestures
            .tick(millis(start, 2500))
            .contains(&GestureIntent::HideTimestamp { bubble: 1 }));
        assert_eq!(
            gestures.tick(millis(start, 3500)),
            vec![GestureIntent::HideTimestamp { bubble: 1 }]
        );
    }

    #[test]
    fn press_beside_bubble_swipes_but_does_not_hold()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(0, 0), PressTarget::row(2));
        assert!(gestures.is_tracking());
        assert!(!gestures.long_press_pending());
        assert!(gestures.tick(millis(start, 1000)).is_empty());

        assert_eq!(gestures.touch_move(Point::new(40, 0)).reveal, Some(2));
    }

    #[test]
    fn held_press_opens_editor()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(10, 10), PressTarget::body(2));
        assert!(gestures.long_press_pending());
        assert!(gestures.tick(millis(start, 499)).is_empty());
        assert_eq!(
            gestures.tick(millis(start, 500)),
            vec![GestureIntent::Edit { bubble: 2 }]
        );
        assert!(!gestures.long_press_pending());
    }

    #[test]
    fn release_or_move_cancels_long_press()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_start(start, Point::new(10, 10), PressTarget::body(2));
        gestures.touch_end(millis(start, 200));
        assert!(!gestures
            .tick(millis(start, 600))
            .contains(&GestureIntent::Edit { bubble: 2 }));

        gestures.touch_start(millis(start, 1000), Point::new(10, 10), PressTarget::body(1));
        gestures.touch_move(Point::new(11, 10));
        assert!(!gestures.long_press_pending());
        assert!(!gestures
            .tick(millis(start, 2000))
            .contains(&GestureIntent::Edit { bubble: 1 }));
    }

    #[test]
    fn triple_tap_composes()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        assert_eq!(gestures.touch_end(start), None);
        assert_eq!(gestures.touch_end(millis(start, 150)), None);
        assert_eq!(gestures.touch_end(millis(start, 300)), Some(GestureIntent::Compose));
        assert_eq!(gestures.tap_count(), 0);

        // the cancelled window must not reset a later sequence
        assert_eq!(gestures.touch_end(millis(start, 400)), None);
        gestures.tick(millis(start, 801));
        assert_eq!(gestures.tap_count(), 1);
    }

    #[test]
    fn tap_after_window_starts_over()
    {
        let start = Instant::now();
        let mut gestures = GestureHandler::default();

        gestures.touch_end(start);
        gestures.touch_end(millis(start, 200));
        assert_eq!(gestures.tap_count(), 2);

        assert!(gestures.tick(millis(start, 500)).is_empty());
        assert_eq!(gestures.tap_count(), 0);

        assert_eq!(gestures.touch_end(millis(start, 600)), None);
        assert_eq!(gestures.tap_count(), 1);
    }

    #[test]
    fn cell_metrics_scale_positions()
    {
        let metrics = CellMetrics::default();
        assert_eq!(metrics.to_point(4, 2), Point::new(32, 32));
    }
}
