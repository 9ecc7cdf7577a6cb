//! "Thinking" placeholder animation.
//!
//! The label grows by one dot per tick and wraps back to a single dot after
//! three. Ticks come from a timer that exists only while a request is
//! outstanding.

use std::time::Duration;
use tokio::task::JoinHandle;

use crate::tui::{AppEvent, EventSender};

const MAX_DOTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ThinkingIndicator {
    base: String,
    dots: usize,
}

impl ThinkingIndicator {
    pub fn new(assistant_name: &str) -> Self {
        Self {
            base: format!("💭 {} is thinking", assistant_name),
            dots: 0,
        }
    }

    pub fn reset(&mut self) {
        self.dots = 0;
    }

    /// Advance one frame and return the new label
    pub fn tick(&mut self) -> String {
        self.dots = self.dots % MAX_DOTS + 1;
        self.label()
    }

    pub fn label(&self) -> String {
        format!("{}{}", self.base, ".".repeat(self.dots))
    }
}

/// Periodic tick source tied to one request
#[derive(Debug, Default)]
pub struct ThinkingTimer {
    handle: Option<JoinHandle<()>>,
}

impl ThinkingTimer {
    /// Start ticking, replacing any timer that is still running
    pub fn start(&mut self, events: EventSender, period: Duration) {
        self.stop();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of an interval fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if events.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ThinkingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
