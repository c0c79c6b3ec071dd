//! Host application lifecycle signals.
//!
//! Signals only move the tracker between foreground and background. They
//! never start or stop tracking: continuing in the background is left to
//! the location source's own low-power mode.

use super::state::LifecycleState;

/// Inbound notification that the host changed execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The app is about to enter the foreground.
    Resume,
    /// The app entered the background.
    Suspend,
    /// The app is about to lose focus.
    WillResign,
}

impl LifecycleSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleSignal::Resume => "resume",
            LifecycleSignal::Suspend => "suspend",
            LifecycleSignal::WillResign => "will-resign",
        }
    }
}

impl LifecycleState {
    /// State after `signal`. Every signal is accepted in every state.
    pub fn apply(self, signal: LifecycleSignal) -> LifecycleState {
        match signal {
            LifecycleSignal::Resume => LifecycleState::Foreground,
            LifecycleSignal::Suspend | LifecycleSignal::WillResign => LifecycleState::Background,
        }
    }
}
