//! Toast delivery for browser contexts.
//!
//! Toasts are published as a `toast` `CustomEvent` on `window` with the serialized [`Toast`] as
//! `detail`; the UI layer owns rendering.

use platform_host::{NotificationService, Toast};

/// Name of the window event carrying toasts.
pub const TOAST_EVENT: &str = "toast";

#[derive(Debug, Clone, Copy, Default)]
/// Browser notification adapter dispatching window events.
pub struct WebNotificationService;

impl NotificationService for WebNotificationService {
    fn notify(&self, toast: &Toast) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window().ok_or_else(|| "window unavailable".to_string())?;
            let detail = serde_wasm_bindgen::to_value(toast)
                .map_err(|err| format!("toast serialization failed: {err}"))?;
            let init = web_sys::CustomEventInit::new();
            init.set_detail(&detail);
            let event = web_sys::CustomEvent::new_with_event_init_dict(TOAST_EVENT, &init)
                .map_err(|err| format!("toast event creation failed: {err:?}"))?;
            window
                .dispatch_event(&event)
                .map(|_| ())
                .map_err(|err| format!("toast dispatch failed: {err:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = toast;
            Ok(())
        }
    }
}
