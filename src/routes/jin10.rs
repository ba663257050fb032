// src/routes/jin10.rs
// 金十数据 (ushknews mirror) flash wire.
//
// GET /jin10/flash/{channel?}?limit=50&important_only=1

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppError;
use crate::feed::{self, Enclosure, FeedEnvelope, FeedItem};
use crate::noise::{is_noise, FlashSignals};
use crate::normalize::{fallback_title, split_bracket_title};
use crate::render;

const ROOT_URL: &str = "https://www.ushknews.com";
const API_URL: &str = "https://flash-api.ushknews.com/get_flash_list_with_channel";
const DEFAULT_LIMIT: usize = 50;
const FALLBACK_TITLE_CHARS: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct FlashResponse {
    #[serde(default)]
    pub data: Vec<FlashItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FlashItem {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub important: i64,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub data: FlashData,
    #[serde(default)]
    pub remark: Vec<Remark>,
    #[serde(default)]
    pub tags: Vec<serde_json::Value>,
    #[serde(default)]
    pub channel: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FlashData {
    #[serde(default)]
    pub content: String,
    pub title: Option<String>,
    pub vip_level: Option<i64>,
    pub lock: Option<bool>,
    pub pic: Option<String>,
    pub source: Option<String>,
    pub source_link: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Remark {
    pub pic: Option<String>,
    pub category_name: Option<String>,
    pub symbol: Option<String>,
}

impl FlashItem {
    fn signals(&self) -> FlashSignals<'_> {
        FlashSignals {
            promo_type: self.kind == 1,
            vip_locked: self.data.lock.unwrap_or(false)
                || self.data.vip_level.unwrap_or(0) > 0,
            content: &self.data.content,
        }
    }

    fn guid(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FlashQuery {
    pub limit: Option<usize>,
    pub important_only: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FlashOptions {
    pub channel: String,
    pub limit: usize,
    pub important_only: bool,
}

fn map_item(item: &FlashItem) -> FeedItem {
    let content = item.data.content.as_str();

    let (title, body) = match split_bracket_title(content) {
        Some((title, body)) => (title, body),
        None => {
            let title = item
                .data
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| fallback_title(content, FALLBACK_TITLE_CHARS));
            (title, content.to_string())
        }
    };

    let mut description = body;
    if let Some(source) = item.data.source.as_deref() {
        description.push_str(&render::source_footer(source, item.data.source_link.as_deref()));
    }

    let mut images: Vec<String> = Vec::new();
    if let Some(pic) = item.data.pic.as_deref().filter(|p| !p.is_empty()) {
        images.push(pic.to_string());
    }
    images.extend(
        item.remark
            .iter()
            .filter_map(|r| r.pic.clone())
            .filter(|p| !p.is_empty()),
    );

    let mut categories: Vec<String> = Vec::new();
    if item.important == 1 {
        categories.push("重要".to_string());
    }
    if item.data.vip_level.unwrap_or(0) > 0 {
        categories.push("VIP".to_string());
    }
    for tag in &item.tags {
        categories.push(json_label(tag));
    }
    for ch in &item.channel {
        categories.push(json_label(ch));
    }
    for remark in &item.remark {
        if let Some(name) = remark.category_name.clone() {
            categories.push(name);
        }
        if let Some(symbol) = remark.symbol.clone() {
            categories.push(symbol);
        }
    }

    let guid = item.guid();
    FeedItem {
        title,
        link: format!("{ROOT_URL}/#{guid}"),
        description,
        pub_date: feed::from_local_str(&item.time).unwrap_or_else(|| feed::from_epoch_secs(0)),
        guid,
        categories,
        author: Some(
            item.data
                .source
                .clone()
                .unwrap_or_else(|| "金十数据".to_string()),
        ),
        image: images.first().cloned(),
        enclosure: images.first().cloned().map(Enclosure::image),
    }
}

fn json_label(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pure assembly over an already-fetched payload.
pub fn build_feed(resp: &FlashResponse, opts: &FlashOptions) -> FeedEnvelope {
    let before = resp.data.len();
    let mut kept: Vec<&FlashItem> = resp
        .data
        .iter()
        .filter(|item| !is_noise(&item.signals()))
        .collect();
    counter!("feed_noise_filtered_total").increment((before - kept.len()) as u64);

    if opts.important_only {
        kept.retain(|item| item.important == 1);
    }
    kept.truncate(opts.limit);

    let items: Vec<FeedItem> = kept.into_iter().map(map_item).collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let title = feed::title_with_suffixes(
        "金十数据 - 美港电讯",
        &[
            opts.important_only.then_some("重要快讯"),
            (!opts.channel.is_empty()).then_some(opts.channel.as_str()),
        ],
    );
    let description = if opts.important_only {
        "金十数据实时财经快讯（仅重要）"
    } else {
        "金十数据实时财经快讯"
    };

    FeedEnvelope::new(title, ROOT_URL)
        .with_description(description)
        .with_items(items)
}

pub async fn flash(
    State(state): State<AppState>,
    channel: Option<Path<String>>,
    Query(query): Query<FlashQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let opts = FlashOptions {
        channel: channel.map(|Path(c)| c).unwrap_or_default(),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        important_only: query.important_only.as_deref() == Some("1"),
    };

    let cache_key = format!("jin10:flash:{}", opts.channel);
    let channel_param = opts.channel.clone();
    let client = state.client.clone();
    let raw = state
        .cache
        .try_get(&cache_key, || async move {
            let t0 = std::time::Instant::now();
            let raw = client
                .get_json(
                    API_URL,
                    &[("channel", channel_param)],
                    &[
                        ("x-app-id", "brCYec5s1ova317e"),
                        ("x-version", "1.0.0"),
                        ("referer", "https://www.ushknews.com/"),
                    ],
                )
                .await?;
            metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            Ok(raw)
        })
        .await
        .map_err(AppError::upstream)?;

    let resp: FlashResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_feed(&resp, &opts)))
}
