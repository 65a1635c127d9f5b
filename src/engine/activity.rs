//! The user-visible, timestamped activity log.

use chrono::Local;

/// Timestamped messages shown to the user.
pub struct ActivityLog {
    entries: Vec<String>,
    echo: bool,
}

impl ActivityLog {
    /// `echo` prints every entry to stdout as it is added.
    pub fn new(echo: bool) -> Self {
        Self {
            entries: Vec::new(),
            echo,
        }
    }

    /// Append `[HH:MM:SS] message`.
    pub fn push(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("[{}] {message}", Local::now().format("%H:%M:%S"));
        log::info!("{message}");
        if self.echo {
            println!("{line}");
        }
        self.entries.push(line);
    }

    /// Print a block of text that is not a log entry (forms, listings).
    pub fn show(&self, text: &str) {
        if self.echo {
            println!("{text}");
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }
}
