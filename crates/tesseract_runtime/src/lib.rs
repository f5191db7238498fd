//! Client core for the Tesseract Lemmy front-end.
//!
//! Multi-account session management across federated instances ([`SessionController`]), the saved
//! profile store, per-route data loaders, the media classifier, and the image-proxy rewriter.
//! Host services (storage, toasts, the remote API) arrive through [`platform_host::HostServices`].

pub mod config;
pub mod controller;
pub mod image_proxy;
pub mod loaders;
pub mod media;
pub mod model;
pub mod persistence;
pub mod profiles;
pub mod reducer;
pub mod resolver;
pub mod settings;
pub mod signals;

pub use config::{InstanceConfig, YtFrontends};
pub use controller::{SessionController, SubscriptionId};
pub use image_proxy::{image_proxy_url, image_proxy_url_opt, ProxyContext};
pub use loaders::{LoadContext, LoadError};
pub use media::{classify, post_type, ContentKind, PostDisplayType};
pub use model::*;
pub use profiles::{Direction, ProfileStore};
pub use reducer::{
    reduce_session, ProfilePatch, SessionAction, SessionEffect, SessionError, SessionEvent,
    SessionState,
};
pub use resolver::{resolve, ResolveError, ResolvedSession};
pub use settings::UserSettings;
pub use signals::{
    provide_session_context, use_session_context, SessionContext, SessionProvider,
};
