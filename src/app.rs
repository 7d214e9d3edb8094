//! Watch mode state
//!
//! Holds what the watch screen shows, applies updates coming from the
//! background refresh task, and handles keyboard input.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::refresh::RefreshMessage;
use crate::service::Report;

/// State of the live weather view
pub struct WatchApp {
    /// Location being watched, as typed by the user
    pub location: String,
    /// Latest successful report
    pub report: Option<Report>,
    /// Error from the most recent refresh, cleared on success
    pub last_error: Option<String>,
    /// Timestamp of last successful refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// A refresh cycle is in progress
    pub refreshing: bool,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
}

impl WatchApp {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            report: None,
            last_error: None,
            last_refresh: None,
            refreshing: true,
            refresh_requested: false,
            show_help: false,
            should_quit: false,
        }
    }

    /// Applies a message from the refresh task
    pub fn apply(&mut self, message: RefreshMessage) {
        match message {
            RefreshMessage::RefreshStarted => {
                self.refreshing = true;
            }
            RefreshMessage::Updated(report) => {
                self.report = Some(report);
                self.last_error = None;
                self.last_refresh = Some(Local::now());
            }
            RefreshMessage::RefreshError(err) => {
                // Keep showing the last good report alongside the error
                self.last_error = Some(err);
            }
            RefreshMessage::RefreshCompleted => {
                self.refreshing = false;
            }
        }
    }

    /// Handles keyboard input
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                self.refresh_requested = true;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Returns and clears a pending refresh request
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }
}
