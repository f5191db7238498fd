//! Page-origin lookup.

/// Returns `window.location.origin` (e.g. `https://tesseract.example`) when running in a page.
pub fn page_origin() -> Option<String> {
    #[cfg(target_arch = "wasm32")]
    {
        let origin = web_sys::window()?.location().origin().ok()?;
        (!origin.is_empty() && origin != "null").then_some(origin)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}
