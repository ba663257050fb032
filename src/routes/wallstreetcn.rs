// src/routes/wallstreetcn.rs
// 华尔街见闻 live wire. Plain JSON API, one channel per feed, server-side
// importance score used as a client filter.
//
// GET /wallstreetcn/live/{category?}/{score?}?limit=100

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppError;
use crate::feed::{self, FeedEnvelope, FeedItem};
use crate::normalize::fallback_title;
use crate::render;

const ROOT_URL: &str = "https://wallstreetcn.com";
const API_URL: &str = "https://api-one.wallstcn.com/apiv1/content/lives";
const DEFAULT_LIMIT: usize = 100;
const DEFAULT_SCORE: i64 = 1;
const FALLBACK_TITLE_CHARS: usize = 100;

/// Channel slug -> display label.
pub static CHANNELS: &[(&str, &str)] = &[
    ("global", "要闻"),
    ("a-stock", "A股"),
    ("us-stock", "美股"),
    ("hk-stock", "港股"),
    ("forex", "外汇"),
    ("commodity", "商品"),
    ("financing", "理财"),
];

pub fn channel_label(slug: &str) -> &'static str {
    CHANNELS
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, label)| *label)
        .unwrap_or("要闻")
}

#[derive(Debug, Deserialize, Default)]
pub struct LiveResponse {
    #[serde(default)]
    pub data: LiveData,
}

#[derive(Debug, Deserialize, Default)]
pub struct LiveData {
    #[serde(default)]
    pub items: Vec<LiveItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LiveItem {
    #[serde(default)]
    pub id: i64,
    pub title: Option<String>,
    #[serde(default)]
    pub content_text: String,
    #[serde(default)]
    pub content: String,
    pub content_more: Option<String>,
    #[serde(default)]
    pub display_time: i64,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub score: i64,
    pub author: Option<LiveAuthor>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub tags: Vec<serde_json::Value>,
    #[serde(default)]
    pub related_themes: Vec<serde_json::Value>,
    #[serde(default)]
    pub cover_images: Vec<serde_json::Value>,
    #[serde(default)]
    pub images: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LiveAuthor {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct LiveQuery {
    pub limit: Option<usize>,
}

/// Tags and themes come as either bare strings or `{name}` objects.
fn label_of(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// Images come as URL strings or objects with a `uri` field.
fn image_of(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("uri")
            .or_else(|| map.get("url"))
            .and_then(|n| n.as_str())
            .map(str::to_string),
        _ => None,
    }
}

fn map_item(item: &LiveItem) -> FeedItem {
    let title = item
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title(&item.content_text, FALLBACK_TITLE_CHARS));

    let mut description = item.content.clone();
    if let Some(more) = item.content_more.as_deref().filter(|m| !m.is_empty()) {
        description.push_str(more);
    }
    let image_pool = if item.cover_images.is_empty() {
        &item.images
    } else {
        &item.cover_images
    };
    let images: Vec<String> = image_pool.iter().filter_map(image_of).collect();
    description.push_str(&render::image_tags(&images));

    let mut categories: Vec<String> = item
        .channels
        .iter()
        .map(|c| c.trim_end_matches("-channel").to_string())
        .collect();
    categories.extend(item.tags.iter().filter_map(label_of));
    categories.extend(item.related_themes.iter().filter_map(label_of));

    FeedItem {
        title,
        link: item.uri.clone(),
        description,
        pub_date: feed::from_epoch_secs(item.display_time),
        guid: format!("wallstreetcn-live-{}", item.id),
        categories,
        author: item
            .author
            .as_ref()
            .map(|a| a.display_name.clone())
            .filter(|n| !n.is_empty()),
        image: images.first().cloned(),
        enclosure: None,
    }
}

pub fn build_feed(resp: &LiveResponse, category: &str, score: i64) -> FeedEnvelope {
    let items: Vec<FeedItem> = resp
        .data
        .items
        .iter()
        .filter(|item| item.score >= score)
        .map(map_item)
        .collect();
    counter!("feed_items_total").increment(items.len() as u64);

    FeedEnvelope::new(
        format!("华尔街见闻 - 快讯 - {}", channel_label(category)),
        format!("{ROOT_URL}/live/{category}"),
    )
    .with_items(items)
}

pub async fn live(
    State(state): State<AppState>,
    params: Option<Path<Vec<String>>>,
    Query(query): Query<LiveQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    let category = params
        .first()
        .cloned()
        .unwrap_or_else(|| "global".to_string());
    let score = match params.get(1) {
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            AppError::BadRequest(format!("score segment must be an integer, got `{raw}`"))
        })?,
        None => DEFAULT_SCORE,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let t0 = std::time::Instant::now();
    let raw = state
        .client
        .get_json(
            API_URL,
            &[
                ("channel", format!("{category}-channel")),
                ("limit", limit.to_string()),
            ],
            &[],
        )
        .await
        .map_err(AppError::upstream)?;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let resp: LiveResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_feed(&resp, &category, score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> LiveResponse {
        serde_json::from_value(json!({
            "data": {
                "items": [
                    {
                        "id": 301,
                        "title": "美联储官员放鸽",
                        "content": "<p>年内降息预期升温。</p>",
                        "content_text": "年内降息预期升温。",
                        "content_more": "<p>多位官员表态。</p>",
                        "display_time": 1_700_000_000,
                        "uri": "https://wallstreetcn.com/livenews/301",
                        "score": 2,
                        "author": { "display_name": "见闻编辑" },
                        "channels": ["global-channel", "us-stock-channel"],
                        "tags": [{ "name": "美联储" }, "利率"],
                        "related_themes": [{ "name": "货币政策" }],
                        "cover_images": [{ "uri": "https://img.test/w.jpg" }]
                    },
                    {
                        "id": 302,
                        "content": "<p>普通快讯正文。</p>",
                        "content_text": "普通快讯正文。",
                        "display_time": 1_700_000_060,
                        "uri": "https://wallstreetcn.com/livenews/302",
                        "score": 1
                    }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn score_threshold_filters_items() {
        assert_eq!(build_feed(&fixture(), "global", 1).items.len(), 2);
        let important = build_feed(&fixture(), "global", 2);
        assert_eq!(important.items.len(), 1);
        assert_eq!(important.items[0].title, "美联储官员放鸽");
    }

    #[test]
    fn categories_strip_channel_suffix_and_merge_labels() {
        let env = build_feed(&fixture(), "global", 1);
        assert_eq!(
            env.items[0].categories,
            vec!["global", "us-stock", "美联储", "利率", "货币政策"]
        );
    }

    #[test]
    fn missing_title_falls_back_to_content_text() {
        let env = build_feed(&fixture(), "global", 1);
        assert_eq!(env.items[1].title, "普通快讯正文。");
        assert_eq!(env.items[1].guid, "wallstreetcn-live-302");
    }

    #[test]
    fn content_more_and_cover_images_append_to_description() {
        let env = build_feed(&fixture(), "global", 1);
        let d = &env.items[0].description;
        assert!(d.contains("多位官员表态。"));
        assert!(d.contains("https://img.test/w.jpg"));
        assert_eq!(env.items[0].image.as_deref(), Some("https://img.test/w.jpg"));
    }

    #[test]
    fn channel_labels_resolve_with_global_fallback() {
        assert_eq!(channel_label("a-stock"), "A股");
        assert_eq!(channel_label("financing"), "理财");
        assert_eq!(channel_label("nonsense"), "要闻");
        let env = build_feed(&fixture(), "hk-stock", 1);
        assert_eq!(env.title, "华尔街见闻 - 快讯 - 港股");
        assert_eq!(env.link, "https://wallstreetcn.com/live/hk-stock");
    }
}
