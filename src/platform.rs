use log::debug;
use thiserror::Error;

/// Failures from platform capabilities. Callers treat these as loggable,
/// never fatal.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("clipboard: {0}")]
    Clipboard(String),
}

/// System clipboard as an injected capability so tests can substitute a
/// fake.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), PlatformError>;
}

/// Production clipboard backed by arboard. A fresh handle is opened per
/// write; some platforms invalidate long-lived ones.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), PlatformError> {
        debug!("copying {} chars to clipboard", text.len());

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| PlatformError::Clipboard(format!("failed to open clipboard: {}", e)))?;

        clipboard
            .set_text(text)
            .map_err(|e| PlatformError::Clipboard(format!("failed to copy: {}", e)))
    }
}

/// In-memory clipboard for tests.
#[derive(Debug, Default)]
pub struct FakeClipboard {
    pub contents: Option<String>,
    pub fail: bool,
}

impl Clipboard for FakeClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), PlatformError> {
        if self.fail {
            return Err(PlatformError::Clipboard(
                "fake clipboard rejected the write".to_string(),
            ));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Location a fresh session lives at before any link is involved.
pub const DEFAULT_LOCATION: &str = "skimr://paste";

/// Push-only navigation history; the newest entry is the current location.
#[derive(Debug)]
pub struct SessionHistory {
    past: Vec<String>,
    current: String,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::starting_at(DEFAULT_LOCATION.to_string())
    }

    pub fn starting_at(location: String) -> Self {
        Self {
            past: Vec::new(),
            current: location,
        }
    }

    pub fn location(&self) -> &str {
        &self.current
    }

    /// Push a new entry; the previous location remains in the back stack.
    pub fn push(&mut self, location: String) {
        self.past.push(std::mem::replace(&mut self.current, location));
    }

    /// Number of entries, current location included.
    pub fn depth(&self) -> usize {
        self.past.len() + 1
    }
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new()
    }
}
