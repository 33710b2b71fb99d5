use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::fs::scanner::ScannedFile;
use crate::fs::tree::FileSystemItem;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// Bracketed paste text.
    Paste(String),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// One level of a managed folder finished loading (or failed).
    ChildrenLoaded {
        path: PathBuf,
        result: Result<Vec<FileSystemItem>>,
    },
    /// A recursive config scan for the import dialog finished.
    ScanFinished {
        root: PathBuf,
        result: Result<Vec<ScannedFile>>,
    },
}

/// Terminal input and background results, merged into one channel.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    /// Start the input reader; a `Tick` is sent whenever `tick_rate`
    /// passes without input.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let input_tx = tx.clone();
        // crossterm's poll/read block, so the reader gets its own thread.
        std::thread::spawn(move || read_input(tick_rate, input_tx));
        Self { rx, tx }
    }

    /// Sender for background jobs to report back on.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| AppError::Terminal("Event channel closed".into()))
    }
}

fn read_input(tick_rate: Duration, tx: mpsc::UnboundedSender<Event>) {
    loop {
        let ev = match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                Ok(raw) => match from_terminal(raw) {
                    Some(ev) => ev,
                    None => continue,
                },
                Err(e) => {
                    tracing::error!(error = %e, "terminal read failed");
                    break;
                }
            },
            Ok(false) => Event::Tick,
            Err(e) => {
                tracing::error!(error = %e, "terminal poll failed");
                break;
            }
        };
        if tx.send(ev).is_err() {
            break;
        }
    }
}

/// Map a raw terminal event; focus changes are dropped.
pub fn from_terminal(raw: CrosstermEvent) -> Option<Event> {
    match raw {
        CrosstermEvent::Key(key) => Some(Event::Key(key)),
        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
        CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => None,
    }
}
