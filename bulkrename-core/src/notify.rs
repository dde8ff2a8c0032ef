use nu_ansi_term::Color;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyLevel {
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A link attached to a notification, e.g. the operation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperlink {
    pub label: String,
    pub target: String,
}

impl Hyperlink {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: target.into(),
        }
    }
}

/// Transient user-facing messages.
pub trait Notifier {
    fn notify(&self, level: NotifyLevel, message: &str, link: Option<&Hyperlink>);

    fn success(&self, message: &str) {
        self.notify(NotifyLevel::Success, message, None);
    }

    fn warning(&self, message: &str) {
        self.notify(NotifyLevel::Warning, message, None);
    }

    fn error(&self, message: &str) {
        self.notify(NotifyLevel::Error, message, None);
    }
}

/// Writes notifications to stderr, colored when enabled.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    use_color: bool,
}

impl TerminalNotifier {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    pub fn format(&self, level: NotifyLevel, message: &str, link: Option<&Hyperlink>) -> String {
        let tag = match level {
            NotifyLevel::Success => "✓",
            NotifyLevel::Warning => "!",
            NotifyLevel::Error => "✗",
        };
        let mut line = if self.use_color {
            let color = match level {
                NotifyLevel::Success => Color::Green,
                NotifyLevel::Warning => Color::Yellow,
                NotifyLevel::Error => Color::Red,
            };
            format!("{} {}", color.bold().paint(tag), message)
        } else {
            format!("{} {}", tag, message)
        };
        if let Some(link) = link {
            line.push_str(&format!(" ({}: {})", link.label, link.target));
        }
        line
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, link: Option<&Hyperlink>) {
        eprintln!("{}", self.format(level, message, link));
    }
}

/// Keeps notifications in memory instead of showing them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<(NotifyLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(NotifyLevel, String)> {
        self.messages.borrow().clone()
    }

    pub fn count(&self, level: NotifyLevel) -> usize {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NotifyLevel, message: &str, link: Option<&Hyperlink>) {
        let text = match link {
            Some(link) => format!("{} ({})", message, link.target),
            None => message.to_string(),
        };
        self.messages.borrow_mut().push((level, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format_with_link() {
        let notifier = TerminalNotifier::new(false);
        let link = Hyperlink::new("log", ".bulkrename/logs/a.log");
        assert_eq!(
            notifier.format(NotifyLevel::Error, "Can not checkout files", Some(&link)),
            "✗ Can not checkout files (log: .bulkrename/logs/a.log)"
        );
        assert_eq!(notifier.format(NotifyLevel::Success, "Done", None), "✓ Done");
    }

    #[test]
    fn test_colored_format_has_escapes() {
        let notifier = TerminalNotifier::new(true);
        assert!(notifier
            .format(NotifyLevel::Warning, "careful", None)
            .contains("\u{1b}["));
    }

    #[test]
    fn test_recording_notifier_counts() {
        let notifier = RecordingNotifier::new();
        notifier.success("ok");
        notifier.error("bad");
        notifier.error("worse");
        assert_eq!(notifier.count(NotifyLevel::Error), 2);
        assert_eq!(notifier.messages()[0], (NotifyLevel::Success, "ok".to_string()));
    }
}
