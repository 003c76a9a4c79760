//! User-facing status lines and failure descriptors.
//!
//! Every action ends in exactly one [`StatusMessage`]. Failures additionally
//! carry a [`FailureDescriptor`] (what happened, why, how to fix it) for the
//! verbose output.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Success,
    Info,
    Error,
}

impl StatusTone {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Info => "•",
            Self::Error => "✗",
        }
    }
}

/// One line of user-visible feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub tone: StatusTone,
    pub text: String,
}

impl StatusMessage {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: StatusTone::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: StatusTone::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: StatusTone::Error,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.tone == StatusTone::Error
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tone.icon(), self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Configuration,
    Auth,
    Network,
    Upstream,
    Storage,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Configuration => "⚙️",
            Self::Auth => "🔐",
            Self::Network => "🌐",
            Self::Upstream => "❌",
            Self::Storage => "💾",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Configuration => "Configuration",
            Self::Auth => "Authentication",
            Self::Network => "Network",
            Self::Upstream => "Service",
            Self::Storage => "Storage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

impl FailureDescriptor {
    /// Multi-line rendering used under `--verbose`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{} {}: {}\n  why: {}\n  fix: {}",
            self.category.icon(),
            self.category.label(),
            self.what,
            self.why,
            self.fix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_display_prefixes_icon() {
        assert_eq!(StatusMessage::success("Saved").to_string(), "✓ Saved");
        assert_eq!(StatusMessage::error("Nope").to_string(), "✗ Nope");
        assert!(StatusMessage::error("x").is_error());
        assert!(!StatusMessage::info("x").is_error());
    }

    #[test]
    fn test_failure_descriptor_render_includes_all_parts() {
        let rendered = FailureDescriptor {
            category: FailureCategory::Network,
            what: "Service unreachable",
            why: "DNS failed",
            fix: "Retry later",
        }
        .render();
        assert!(rendered.contains("Network: Service unreachable"));
        assert!(rendered.contains("why: DNS failed"));
        assert!(rendered.contains("fix: Retry later"));
    }
}
