//! The state machine behind the hover icon mode.

use std::fmt;

/// Which surface the user currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    /// The main window with the full project UI.
    Full,
    /// The small always-on-top icon.
    Hover,
}

impl UiMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UiMode::Full => "full",
            UiMode::Hover => "hover",
        }
    }

    /// Parses a persisted mode string; anything unrecognized means Full.
    pub fn parse(value: &str) -> Self {
        match value {
            "hover" => UiMode::Hover,
            _ => UiMode::Full,
        }
    }
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTrigger {
    /// Collapse the main window into the hover icon.
    Minimize,
    /// Restore the main window from the hover icon.
    Expand,
    /// Click the hover icon (or the export button).
    Activate,
}

/// What the shell must do in response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEffect {
    EnterHover,
    EnterFull,
    TriggerExport,
}

/// Tracks the UI mode and translates triggers into shell effects.
///
/// Activation never changes the mode: clicking the hover icon fires an
/// export and the icon stays put.
#[derive(Debug)]
pub struct HoverController {
    mode: UiMode,
}

impl HoverController {
    pub fn new(mode: UiMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    /// Applies a trigger. Returns the effect the shell should carry out,
    /// or `None` when the trigger is a no-op in the current mode.
    pub fn trigger(&mut self, trigger: HoverTrigger) -> Option<HoverEffect> {
        match (self.mode, trigger) {
            (UiMode::Full, HoverTrigger::Minimize) => {
                self.mode = UiMode::Hover;
                Some(HoverEffect::EnterHover)
            }
            (UiMode::Hover, HoverTrigger::Expand) => {
                self.mode = UiMode::Full;
                Some(HoverEffect::EnterFull)
            }
            (_, HoverTrigger::Activate) => Some(HoverEffect::TriggerExport),
            _ => None,
        }
    }
}
