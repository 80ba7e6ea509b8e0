//! User-visible page messages and error modeling for the page controller.

use crate::{api::ClientError, store::StoreError};

/// Messages the page shows to the user, in emission order.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Info(String),
    /// A successful search that matched nothing.
    NoMatch(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    NotFound,
    Render,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    List,
    Search,
    Create,
    UpdatePrice,
    UpdateStatus,
    Delete,
    Refresh,
    Submit,
}

impl UiErrorContext {
    fn retry_hint(self) -> &'static str {
        match self {
            UiErrorContext::List => "Error getting listings!  Try again...",
            UiErrorContext::Search => "Error searching!  Try again...",
            UiErrorContext::Create => "Error creating!  Try again...",
            UiErrorContext::UpdatePrice => "Error updating price!  Try again...",
            UiErrorContext::UpdateStatus => "Error updating status!  Try again...",
            UiErrorContext::Delete => "Error deleting listing!  Try again...",
            UiErrorContext::Refresh => "Error refreshing listings!  Try again...",
            UiErrorContext::Submit => "Unrecognized form submission",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    detail: Option<String>,
}

impl UiError {
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
            detail: None,
        }
    }

    /// Maps a failed API call to the retry message shown for `context`.
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Transport(_) | ClientError::Decode(_) => UiErrorCategory::Transport,
            ClientError::Status { status, .. } if *status == 404 => UiErrorCategory::NotFound,
            ClientError::Status { status, .. } if (400..500).contains(status) => {
                UiErrorCategory::Validation
            }
            ClientError::Status { .. } => UiErrorCategory::Transport,
            ClientError::Config(_) => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: context.retry_hint().to_string(),
            detail: Some(err.to_string()),
        }
    }

    pub fn from_store(context: UiErrorContext, err: &StoreError) -> Self {
        Self {
            category: UiErrorCategory::Render,
            context,
            message: "Could not redraw the page; reload to see the latest listings.".to_string(),
            detail: Some(err.to_string()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category,
            UiErrorCategory::Transport | UiErrorCategory::Render
        )
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({detail})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for UiError {}
