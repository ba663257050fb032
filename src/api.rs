// src/api.rs
// Router assembly. Each provider route is registered twice when it takes an
// optional path segment; axum 0.8 has no optional parameters.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::cache::FeedCache;
use crate::client::ProviderClient;
use crate::config::Config;
use crate::error::AppError;
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub client: ProviderClient,
    pub cache: Arc<FeedCache>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = ProviderClient::new(config.request_timeout()).map_err(AppError::Internal)?;
        Ok(Self {
            client,
            cache: Arc::new(FeedCache::new(config.cache_ttl())),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/jin10/flash", get(routes::jin10::flash))
        .route("/jin10/flash/{channel}", get(routes::jin10::flash))
        .route("/cls/telegraph", get(routes::cls::telegraph))
        .route("/cls/telegraph/{category}", get(routes::cls::telegraph))
        .route("/eastmoney/kuaixun", get(routes::eastmoney::kuaixun))
        .route("/eastmoney/kuaixun/{category}", get(routes::eastmoney::kuaixun))
        .route("/sina/724", get(routes::sina::news724))
        .route("/sina/724/{tag}", get(routes::sina::news724))
        .route("/sina/zhibo", get(routes::sina::zhibo))
        .route("/sina/zhibo/{channel}", get(routes::sina::zhibo))
        .route("/kaipanla/news", get(routes::kaipanla::news))
        .route("/kaipanla/news/{kind}", get(routes::kaipanla::news))
        .route("/kaipanla/zhibo", get(routes::kaipanla::zhibo))
        .route("/kaipanla/zhibo/{category}", get(routes::kaipanla::zhibo))
        .route("/kaipanla/review", get(routes::kaipanla::review))
        .route("/tencent/newslist", get(routes::tencent::newslist))
        .route("/wallstreetcn/live", get(routes::wallstreetcn::live))
        .route("/wallstreetcn/live/{category}", get(routes::wallstreetcn::live))
        .route(
            "/wallstreetcn/live/{category}/{score}",
            get(routes::wallstreetcn::live),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
