//! Toast notification contracts and adapters.

use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a toast, used by the UI for styling.
pub enum ToastLevel {
    /// Neutral information.
    Info,
    /// Completed action.
    Success,
    /// Recoverable problem the user should act on.
    Warning,
    /// Failed operation.
    Error,
}

impl ToastLevel {
    /// Returns a stable lowercase token for diagnostics and CSS class names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
/// Follow-up offered by a toast when the user clicks it.
pub enum ToastAction {
    /// Navigate the client to an in-app path.
    Navigate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A user-visible, non-blocking notification.
pub struct Toast {
    /// Short heading.
    pub title: String,
    /// Message body.
    pub content: String,
    /// Severity.
    pub level: ToastLevel,
    /// How long the toast stays visible; `None` uses the UI default.
    pub duration_ms: Option<u32>,
    /// Optional click action.
    pub action: Option<ToastAction>,
}

impl Toast {
    /// Creates a toast with the UI default duration and no action.
    pub fn new(level: ToastLevel, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            level,
            duration_ms: None,
            action: None,
        }
    }

    /// Overrides the display duration.
    pub fn with_duration_ms(mut self, duration_ms: u32) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attaches a click action.
    pub fn with_action(mut self, action: ToastAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Host service for user-visible notifications.
pub trait NotificationService {
    /// Dispatches a toast.
    fn notify(&self, toast: &Toast) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op notification service for unsupported targets.
pub struct NoopNotificationService;

impl NotificationService for NoopNotificationService {
    fn notify(&self, _toast: &Toast) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
/// Notification service that records every toast, in dispatch order.
pub struct MemoryNotificationService {
    sent: Rc<RefCell<Vec<Toast>>>,
}

impl MemoryNotificationService {
    /// Returns all toasts dispatched so far.
    pub fn sent(&self) -> Vec<Toast> {
        self.sent.borrow().clone()
    }

    /// Drops the recorded toasts.
    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl NotificationService for MemoryNotificationService {
    fn notify(&self, toast: &Toast) -> Result<(), String> {
        self.sent.borrow_mut().push(toast.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_service_records_in_order() {
        let service = MemoryNotificationService::default();
        let observer = service.clone();
        service
            .notify(&Toast::new(ToastLevel::Error, "Auth Error", "first"))
            .expect("notify");
        service
            .notify(
                &Toast::new(ToastLevel::Warning, "Login Expired", "second")
                    .with_duration_ms(30_000)
                    .with_action(ToastAction::Navigate("/login/lemmy.ml".to_string())),
            )
            .expect("notify");

        let sent = observer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].content, "first");
        assert_eq!(sent[1].duration_ms, Some(30_000));
        assert_eq!(
            sent[1].action,
            Some(ToastAction::Navigate("/login/lemmy.ml".to_string()))
        );

        observer.clear();
        assert!(service.sent().is_empty());
    }

    #[test]
    fn toast_serializes_for_the_ui_event_payload() {
        let toast = Toast::new(ToastLevel::Warning, "Login Expired", "log in again")
            .with_action(ToastAction::Navigate("/login/lemmy.ml".to_string()));
        let json = serde_json::to_value(&toast).expect("serialize");
        assert_eq!(json["level"], "warning");
        assert_eq!(json["action"]["type"], "navigate");
        assert_eq!(json["action"]["target"], "/login/lemmy.ml");
        assert!(json["duration_ms"].is_null());
    }

    #[test]
    fn level_tokens_are_stable() {
        assert_eq!(ToastLevel::Warning.as_str(), "warning");
        assert_eq!(ToastLevel::Error.as_str(), "error");
    }
}
