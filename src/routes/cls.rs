// src/routes/cls.rs
// 财联社 telegraph wire. Requests carry the cls.cn signed query string.
//
// GET /cls/telegraph/{category?}?limit=50

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;

use crate::api::AppState;
use crate::client::cls_signed_query;
use crate::error::AppError;
use crate::feed::{self, Enclosure, FeedEnvelope, FeedItem};
use crate::instrument::{partition, InstrumentRef, Trend};
use crate::normalize::strip_repeated_bracket_title;
use crate::render;

const ROOT_URL: &str = "https://www.cls.cn";
const DEFAULT_LIMIT: usize = 50;

/// Category slug -> display label, as the telegraph page names them.
pub static CATEGORIES: &[(&str, &str)] = &[
    ("watch", "看盘"),
    ("announcement", "公司"),
    ("explain", "解读"),
    ("red", "加红"),
    ("jpush", "推送"),
    ("remind", "提醒"),
    ("fund", "基金"),
    ("hk", "港股"),
];

pub fn category_label(slug: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, label)| *label)
}

#[derive(Debug, Deserialize, Default)]
pub struct TelegraphResponse {
    #[serde(default)]
    pub data: TelegraphData,
}

#[derive(Debug, Deserialize, Default)]
pub struct TelegraphData {
    #[serde(default)]
    pub roll_data: Vec<TelegraphItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct TelegraphItem {
    #[serde(default)]
    pub id: i64,
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    pub brief: Option<String>,
    pub level: Option<String>,
    #[serde(default)]
    pub ctime: i64,
    pub shareurl: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub stock_list: Vec<StockRef>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub audio_url: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Subject {
    #[serde(default)]
    pub subject_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct StockRef {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "StockID")]
    pub stock_id: Option<String>,
    #[serde(rename = "RiseRange", default)]
    pub rise_range: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct TelegraphQuery {
    pub limit: Option<usize>,
}

fn level_prefix(level: Option<&str>) -> &'static str {
    match level {
        Some("A") => "🔴 ",
        Some("B") => "🟡 ",
        _ => "",
    }
}

fn map_item(item: &TelegraphItem) -> FeedItem {
    let headline = item
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .or(item.brief.as_deref())
        .unwrap_or(&item.content);
    let title = format!("{}{}", level_prefix(item.level.as_deref()), headline);

    // Stock mentions double as categories with the arrow convention.
    let stock_categories: Vec<String> = item
        .stock_list
        .iter()
        .map(|s| {
            let trend = Trend::from_change(s.rise_range);
            format!("{} {}{}%", s.name, trend.arrow(), s.rise_range)
        })
        .collect();
    let mut categories: Vec<String> = item
        .subjects
        .iter()
        .map(|s| s.subject_name.clone())
        .collect();
    categories.extend(stock_categories);

    let refs: Vec<InstrumentRef> = item
        .stock_list
        .iter()
        .map(|s| {
            InstrumentRef::new(
                s.stock_id.clone().unwrap_or_default().to_uppercase(),
                s.name.clone(),
                Some(s.rise_range),
            )
        })
        .collect();
    let (sectors, stocks) = partition(refs);

    let body = strip_repeated_bracket_title(headline, &item.content);
    let mut description = body;
    description.push_str(&render::sector_block(&sectors));
    description.push_str(&render::stock_block(&stocks));
    description.push_str(&render::image_tags(&item.images));

    FeedItem {
        title,
        link: item
            .shareurl
            .clone()
            .unwrap_or_else(|| format!("{ROOT_URL}/telegraph")),
        description,
        pub_date: feed::from_epoch_secs(item.ctime),
        guid: format!("cls-telegraph-{}", item.id),
        categories,
        author: item.author.clone(),
        image: item.images.first().cloned(),
        enclosure: item.audio_url.first().cloned().map(Enclosure::audio),
    }
}

pub fn build_feed(resp: &TelegraphResponse, category: &str, limit: usize) -> FeedEnvelope {
    let items: Vec<FeedItem> = resp
        .data
        .roll_data
        .iter()
        .take(limit)
        .map(map_item)
        .collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let title = feed::title_with_suffixes("财联社 - 电报", &[category_label(category)]);
    FeedEnvelope::new(title, format!("{ROOT_URL}/telegraph")).with_items(items)
}

pub async fn telegraph(
    State(state): State<AppState>,
    category: Option<Path<String>>,
    Query(query): Query<TelegraphQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let category = category.map(|Path(c)| c).unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    // The uncategorized listing lives on a different endpoint.
    let api_url = if category.is_empty() {
        format!("{ROOT_URL}/nodeapi/updateTelegraphList")
    } else {
        format!("{ROOT_URL}/v1/roll/get_roll_list")
    };

    let signed = cls_signed_query(&[
        ("category", category.clone()),
        ("hasFirstVipArticle", "1".to_string()),
    ]);
    let query_pairs: Vec<(&str, String)> = signed
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();

    let t0 = std::time::Instant::now();
    let raw = state
        .client
        .get_json(
            &api_url,
            &query_pairs,
            &[("Referer", "https://www.cls.cn/telegraph")],
        )
        .await
        .map_err(AppError::upstream)?;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let resp: TelegraphResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_feed(&resp, &category, limit)))
}
