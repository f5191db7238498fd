//! Remote API contracts: the [`LemmyApi`] service and its wire models.

mod service;
pub mod types;

pub use service::{
    ApiCall, ApiError, ApiTarget, LemmyApi, LemmyApiFuture, MemoryLemmyApi, NoopLemmyApi,
};
