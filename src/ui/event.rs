//! Event handling module for the application
//!
//! This module provides a mechanism to handle events
//! from the main application thread. It uses a channel to send and receive
//! events between the main application and a separate event handling thread.
//!
//! The `EventHandler` struct manages the event handling thread and provides
//! a way to receive events through a channel. Ticks drive the gesture
//! timers, so the tick rate bounds how late a long press can fire.
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use log::error;

/// Events that can be processed by the application
#[derive(Debug, Clone, Copy)]
pub enum Event
{
    /// Regular time tick for firing gesture timers
    Tick,
    /// Keyboard input event
    Key(KeyEvent),
    /// Mouse input event, standing in for touch
    Mouse(MouseEvent),
    /// Terminal resize event with new dimensions
    Resize(u16, u16),
}

/// Handles terminal events
///
/// Manages event handling in a separate thread and provides
/// a way to receive events through a channel.
pub struct EventHandler
{
    /// Receiver side of the event channel to get events from the handler thread
    event_receiver: mpsc::Receiver<Event>,
    /// Sender for shutdown the thread for graceful shutdown
    // The receiver is moved to the thread
    shutdown_sender: mpsc::Sender<()>,
    /// Handle to keep the thread alive
    // Option is used to move the handle in `drop`
    thread_handle: Option<JoinHandle<()>>,
}

impl EventHandler
{
    /// Creates a new event handler with the specified tick rate
    ///
    /// # Arguments
    ///
    /// * `tick_rate` - The duration between tick events
    ///
    /// # Returns
    ///
    /// A new `EventHandler` instance with a running background thread
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self
    {
        // Channel carrying events from the input thread to the main loop
        let (event_sender, event_receiver) = mpsc::channel();
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();

        // The input thread owns the shutdown receiver
        let handle = thread::spawn(move || {
            let mut last_tick = Instant::now();

            loop
            {
                // Stop once the handler is dropped
                if shutdown_receiver.try_recv().is_ok()
                {
                    break;
                }

                // Wait at most until the next tick is due
                // If more time than tick_rate has passed, don't wait at all
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());

                // Poll with a timeout so ticks keep coming without input
                let ready = match event::poll(timeout)
                {
                    Ok(ready) => ready,
                    Err(err) =>
                    {
                        error!("Error polling events: {err}");
                        break;
                    }
                };

                if ready
                {
                    let forwarded = match event::read()
                    {
                        // Keyboard input
                        Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                        // Presses, drags, releases and the wheel
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        // Terminal resize
                        Ok(CrosstermEvent::Resize(width, height)) =>
                        {
                            Some(Event::Resize(width, height))
                        }
                        // Ignore other event types
                        Ok(_) => None,
                        Err(err) =>
                        {
                            error!("Error reading event: {err}");
                            break;
                        }
                    };

                    // Break the loop if sending fails (receiver dropped)
                    if let Some(event) = forwarded &&
                        event_sender.send(event).is_err()
                    {
                        break;
                    }
                }

                // Ticks fire the gesture timers
                if last_tick.elapsed() >= tick_rate
                {
                    if event_sender.send(Event::Tick).is_err()
                    {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            event_receiver,
            shutdown_sender,
            thread_handle: Some(handle),
        }
    }

    /// Gets the next event from the event channel
    ///
    /// This method blocks until an event is available
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is disconnected.
    pub fn next(&self) -> Result<Event>
    {
        self.event_receiver
            .recv()
            .context("Event channel disconnected")
    }
}

impl Drop for EventHandler
{
    fn drop(&mut self)
    {
        // Signal shutdown (ignore if already closed)
        let _ = self.shutdown_sender.send(());

        if let Some(handle) = self.thread_handle.take()
        {
            let _ = handle.join();
        }
    }
}
