use crate::product::ProductId;
use crate::review::ReviewId;
use crate::tracker::SyncStatus;

/// A transient, user-facing notification.
///
/// Operations never print; they emit notices and let the presentation
/// decide how to show them (CLI prints to stderr, a GUI shows a banner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An operation completed.
    Success(String),
    /// Informational message (progress, status updates).
    Info(String),
    /// Warning - operation continued but something noteworthy occurred.
    Warning(String),
    /// Error - the operation failed; the session stays usable.
    Error(String),
}

impl Notice {
    pub fn success(msg: impl Into<String>) -> Self {
        Self::Success(msg.into())
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error(msg.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Get the message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Success(msg) | Self::Info(msg) | Self::Warning(msg) | Self::Error(msg) => msg,
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(msg) | Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
            Self::Error(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// Everything a presentation layer needs to re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEvent {
    /// The in-flight set changed size.
    Status(SyncStatus),
    Notice(Notice),
    /// The product cache was rebuilt wholesale.
    ProductsReplaced,
    ProductChanged(ProductId),
    ProductRemoved(ProductId),
    /// The review cache was rebuilt wholesale.
    ReviewsReplaced,
    ReviewRemoved(ReviewId),
}

impl AdminEvent {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Notice(n) => Some(n),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&SyncStatus> {
        match self {
            Self::Status(s) => Some(s),
            _ => None,
        }
    }
}
