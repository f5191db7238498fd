//! Notification-domain contracts and lightweight test adapters.

mod service;

pub use service::{
    MemoryNotificationService, NoopNotificationService, NotificationService, Toast, ToastAction,
    ToastLevel,
};
