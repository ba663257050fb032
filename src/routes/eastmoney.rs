// src/routes/eastmoney.rs
// 东方财富 global flash wire. The list endpoint answers JSONP; stock codes
// on each item are resolved through a batched quote lookup that is allowed
// to fail without taking the feed down.
//
// GET /eastmoney/kuaixun/{category?}?limit=50&important_only=1

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;

use crate::api::AppState;
use crate::client::ProviderClient;
use crate::error::AppError;
use crate::feed::{self, Enclosure, FeedEnvelope, FeedItem};
use crate::instrument::{classify_eastmoney, InstrumentKind, InstrumentRef};
use crate::normalize::{fallback_title, split_bracket_title};
use crate::render;

const ROOT_URL: &str = "https://kuaixun.eastmoney.com";
const LIST_API: &str = "https://np-weblist.eastmoney.com/comm/web/getFastNewsList";
const QUOTE_API: &str = "https://push2.eastmoney.com/api/qt/clist/get";
const QUOTE_TOKEN: &str = "13697a1cc677c8bfa9a496437bfef419";
const DEFAULT_LIMIT: usize = 50;
const FALLBACK_TITLE_CHARS: usize = 50;

/// Category-code -> label table, passed around by reference rather than
/// consulted as a module global.
pub static CATEGORY_LABELS: &[(&str, &str)] = &[
    ("100", "焦点"),
    ("101", "要闻"),
    ("102", "7*24全球直播"),
    ("103", "上市公司"),
    ("104", "中国公司"),
    ("105", "全球公司"),
    ("106", "商品"),
    ("107", "外汇"),
    ("108", "债券"),
    ("109", "基金"),
    ("110", "地区-中国"),
    ("111", "地区-美国"),
    ("112", "地区-欧元区"),
    ("113", "地区-英国"),
    ("114", "地区-日本"),
    ("115", "地区-加拿大"),
    ("116", "地区-澳洲"),
    ("117", "地区-新兴市场"),
    ("118", "央行-中国"),
    ("119", "央行-美联储"),
    ("120", "央行-欧洲"),
    ("121", "央行-英国"),
    ("122", "央行-日本"),
    ("123", "央行-加拿大"),
    ("124", "央行-澳洲"),
    ("125", "数据-中国"),
    ("126", "数据-美国"),
    ("127", "数据-欧元区"),
    ("128", "数据-英国"),
    ("129", "数据-日本"),
    ("130", "数据-加拿大"),
    ("131", "数据-澳洲"),
];

pub fn category_label(code: &str) -> Option<&'static str> {
    CATEGORY_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

#[derive(Debug, Deserialize, Default)]
pub struct FastNewsResponse {
    #[serde(default)]
    pub data: FastNewsData,
}

#[derive(Debug, Deserialize, Default)]
pub struct FastNewsData {
    #[serde(rename = "fastNewsList", default)]
    pub fast_news_list: Vec<FastNewsItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FastNewsItem {
    pub code: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "showTime", default)]
    pub show_time: String,
    #[serde(rename = "publishTime", default)]
    pub publish_time: String,
    #[serde(default)]
    pub important: i64,
    #[serde(rename = "importantLevel", default)]
    pub important_level: i64,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(rename = "stockList", default)]
    pub stock_list: Vec<String>,
    pub source: Option<String>,
    #[serde(rename = "columnName")]
    pub column_name: Option<String>,
}

impl FastNewsItem {
    fn is_important(&self) -> bool {
        self.important == 1 || self.important_level > 0
    }

    fn guid(&self) -> String {
        self.code
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_default()
    }
}

/// Quote snapshot keyed by `market.code`, resolved from the batch lookup.
#[derive(Debug, Clone, Default)]
pub struct QuoteInfo {
    pub name: String,
    pub change: f64,
}

pub type QuoteMap = HashMap<String, QuoteInfo>;

#[derive(Debug, Deserialize, Default)]
pub struct KuaixunQuery {
    pub limit: Option<usize>,
    pub important_only: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KuaixunOptions {
    pub category: String,
    pub limit: usize,
    pub important_only: bool,
}

fn map_item(item: &FastNewsItem, quotes: &QuoteMap) -> FeedItem {
    let mut title = item.title.trim().to_string();
    let source_content = if item.summary.is_empty() {
        item.content.as_str()
    } else {
        item.summary.as_str()
    };

    // The summary usually reads 【headline】body; the bracket part never
    // repeats into the description.
    let mut content = source_content.to_string();
    if let Some((bracket, rest)) = split_bracket_title(source_content) {
        if title.is_empty() {
            title = bracket;
        }
        content = rest;
    }
    if title.is_empty() {
        title = fallback_title(&content, FALLBACK_TITLE_CHARS);
    }

    let mut description = content;
    description.push_str(&render::image_tags(&item.image));

    let mut refs: Vec<InstrumentRef> = Vec::new();
    for code in &item.stock_list {
        if let Some(info) = quotes.get(code) {
            let kind = classify_eastmoney(code);
            let short_code = code.split('.').nth(1).unwrap_or(code).to_string();
            refs.push(InstrumentRef {
                code: short_code,
                name: info.name.clone(),
                change_percent: Some(info.change),
                kind,
            });
        }
    }
    let (sectors, stocks): (Vec<_>, Vec<_>) =
        refs.into_iter().partition(|r| r.kind == InstrumentKind::Sector);
    description.push_str(&render::sector_block(&sectors));
    description.push_str(&render::stock_block(&stocks));

    if let Some(source) = item.source.as_deref() {
        description.push_str(&render::source_footer(source, None));
    }

    let mut categories: Vec<String> = Vec::new();
    if item.is_important() {
        categories.push("重要".to_string());
    }
    for code in &item.stock_list {
        if let Some(info) = quotes.get(code) {
            categories.push(info.name.clone());
        }
    }
    if let Some(column) = item.column_name.clone() {
        categories.push(column);
    }

    let guid = item.guid();
    let pub_date = feed::from_local_str(&item.show_time)
        .or_else(|| feed::from_local_str(&item.publish_time))
        .unwrap_or_else(|| feed::from_epoch_secs(0));

    FeedItem {
        title,
        link: format!("https://finance.eastmoney.com/a/{guid}.html"),
        description,
        pub_date,
        guid,
        categories,
        author: Some(
            item.source
                .clone()
                .unwrap_or_else(|| "东方财富网".to_string()),
        ),
        image: item.image.first().cloned(),
        enclosure: item.image.first().cloned().map(Enclosure::image),
    }
}

pub fn build_feed(
    resp: &FastNewsResponse,
    quotes: &QuoteMap,
    opts: &KuaixunOptions,
) -> FeedEnvelope {
    let mut kept: Vec<&FastNewsItem> = resp.data.fast_news_list.iter().collect();
    if opts.important_only {
        kept.retain(|item| item.is_important());
    }
    kept.truncate(opts.limit);

    let items: Vec<FeedItem> = kept.into_iter().map(|i| map_item(i, quotes)).collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let label = category_label(&opts.category)
        .map(str::to_string)
        .or_else(|| (!opts.category.is_empty()).then(|| opts.category.clone()));
    let title = feed::title_with_suffixes(
        "东方财富 - 全球财经快讯",
        &[label.as_deref(), opts.important_only.then_some("重要")],
    );
    let mut description = format!(
        "东方财富全球财经快讯{}",
        label.as_deref().map(|l| format!(" - {l}")).unwrap_or_default()
    );
    if opts.important_only {
        description.push_str("（仅重要）");
    }

    let mut env = FeedEnvelope::new(title, ROOT_URL)
        .with_description(description)
        .with_items(items);
    env.language = "zh-CN".to_string();
    env.author = Some("东方财富网".to_string());
    env.image = Some("https://www.eastmoney.com/favicon.ico".to_string());
    env
}

/// Batch-resolve quote snapshots for every code the kept items mention.
/// Any failure leaves the map empty; enrichment is optional.
pub async fn fetch_quotes(client: &ProviderClient, codes: &[String]) -> QuoteMap {
    if codes.is_empty() {
        return QuoteMap::new();
    }
    let fs = codes
        .iter()
        .map(|c| format!("i:{c}"))
        .collect::<Vec<_>>()
        .join(",");

    let raw = match client
        .get_json_enrichment(
            QUOTE_API,
            &[
                ("fs", fs),
                ("fields", "f1,f2,f3,f4,f12,f13,f14,f29".to_string()),
                ("pz", "100".to_string()),
                ("fltt", "2".to_string()),
                ("invt", "2".to_string()),
                ("pn", "1".to_string()),
                ("po", "1".to_string()),
                ("np", "1".to_string()),
                ("ut", QUOTE_TOKEN.to_string()),
            ],
            &[],
        )
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = ?e, "quote enrichment failed, continuing without");
            counter!("feed_enrichment_errors_total").increment(1);
            return QuoteMap::new();
        }
    };

    parse_quote_response(&raw)
}

pub fn parse_quote_response(raw: &serde_json::Value) -> QuoteMap {
    let mut map = QuoteMap::new();
    let diff = raw
        .pointer("/data/diff")
        .and_then(|d| d.as_array())
        .cloned()
        .unwrap_or_default();
    for stock in diff {
        let market = stock.get("f13").map(json_num_string).unwrap_or_default();
        let code = stock
            .get("f12")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if code.is_empty() {
            continue;
        }
        map.insert(
            format!("{market}.{code}"),
            QuoteInfo {
                name: stock
                    .get("f14")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                change: stock.get("f3").and_then(|v| v.as_f64()).unwrap_or(0.0),
            },
        );
    }
    map
}

fn json_num_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn kuaixun(
    State(state): State<AppState>,
    category: Option<Path<String>>,
    Query(query): Query<KuaixunQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let opts = KuaixunOptions {
        category: category.map(|Path(c)| c).unwrap_or_default(),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT),
        important_only: query.important_only.as_deref() == Some("1"),
    };

    // 102 is the 7*24 firehose column.
    let column = if opts.category.is_empty() {
        "102".to_string()
    } else {
        opts.category.clone()
    };

    let t0 = std::time::Instant::now();
    let raw = state
        .client
        .get_jsonp(
            LIST_API,
            &[
                ("client", "web".to_string()),
                ("biz", "web_724".to_string()),
                ("fastColumn", column),
                ("sortEnd", String::new()),
                ("pageSize", opts.limit.to_string()),
                ("req_trace", chrono::Utc::now().timestamp_millis().to_string()),
                ("callback", "jQuery".to_string()),
            ],
            &[("Referer", ROOT_URL)],
            "jQuery",
        )
        .await
        .map_err(AppError::upstream)?;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let resp: FastNewsResponse = serde_json::from_value(raw).unwrap_or_default();

    let mut codes: Vec<String> = Vec::new();
    for item in resp.data.fast_news_list.iter().take(opts.limit) {
        for code in &item.stock_list {
            if !codes.contains(code) {
                codes.push(code.clone());
            }
        }
    }
    let quotes = fetch_quotes(&state.client, &codes).await;

    Ok(Json(build_feed(&resp, &quotes, &opts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> FastNewsResponse {
        serde_json::from_value(json!({
            "data": {
                "fastNewsList": [
                    {
                        "code": "202403010001",
                        "summary": "【A股开盘】两市高开，芯片领涨。",
                        "showTime": "2024-03-01 09:30:00",
                        "important": 1,
                        "stockList": ["0.399001", "1.600519"],
                        "source": "东方财富",
                        "columnName": "要闻"
                    },
                    {
                        "id": "202403010002",
                        "summary": "普通快讯，无股票关联。",
                        "showTime": "2024-03-01 09:31:00"
                    }
                ]
            }
        }))
        .unwrap()
    }

    fn quotes() -> QuoteMap {
        let mut q = QuoteMap::new();
        q.insert(
            "0.399001".to_string(),
            QuoteInfo {
                name: "深证成指".to_string(),
                change: 1.1,
            },
        );
        q.insert(
            "1.600519".to_string(),
            QuoteInfo {
                name: "贵州茅台".to_string(),
                change: -0.4,
            },
        );
        q
    }

    fn opts() -> KuaixunOptions {
        KuaixunOptions {
            category: String::new(),
            limit: DEFAULT_LIMIT,
            important_only: false,
        }
    }

    #[test]
    fn bracket_headline_becomes_title_once() {
        let env = build_feed(&fixture(), &quotes(), &opts());
        assert_eq!(env.items[0].title, "A股开盘");
        assert!(env.items[0].description.starts_with("两市高开，芯片领涨。"));
    }

    #[test]
    fn market_zero_is_sector_market_one_is_stock() {
        let env = build_feed(&fixture(), &quotes(), &opts());
        let d = &env.items[0].description;
        let sector_at = d.find("相关板块").unwrap();
        let stock_at = d.find("相关股票").unwrap();
        assert!(sector_at < stock_at);
        assert!(d.contains("深证成指"));
        assert!(d.contains("(600519)"));
    }

    #[test]
    fn categories_use_quote_names_not_codes() {
        let env = build_feed(&fixture(), &quotes(), &opts());
        assert_eq!(
            env.items[0].categories,
            vec!["重要", "深证成指", "贵州茅台", "要闻"]
        );
    }

    #[test]
    fn missing_quotes_degrade_to_no_blocks() {
        let env = build_feed(&fixture(), &QuoteMap::new(), &opts());
        assert!(!env.items[0].description.contains("相关板块"));
        assert!(!env.items[0].description.contains("相关股票"));
        assert_eq!(env.items.len(), 2);
    }

    #[test]
    fn important_only_keeps_flagged_items() {
        let o = KuaixunOptions {
            important_only: true,
            ..opts()
        };
        let env = build_feed(&fixture(), &quotes(), &o);
        assert_eq!(env.items.len(), 1);
        assert!(env.title.ends_with("- 重要"));
    }

    #[test]
    fn category_code_resolves_to_label() {
        let o = KuaixunOptions {
            category: "119".to_string(),
            ..opts()
        };
        let env = build_feed(&fixture(), &quotes(), &o);
        assert_eq!(env.title, "东方财富 - 全球财经快讯 - 央行-美联储");
    }

    #[test]
    fn quote_response_parses_into_map() {
        let raw = json!({
            "data": {
                "diff": [
                    { "f12": "399001", "f13": 0, "f14": "深证成指", "f3": 1.23 },
                    { "f12": "600519", "f13": 1, "f14": "贵州茅台", "f3": -0.4 }
                ]
            }
        });
        let map = parse_quote_response(&raw);
        assert_eq!(map.get("0.399001").unwrap().name, "深证成指");
        assert_eq!(map.get("1.600519").unwrap().change, -0.4);
    }

    #[test]
    fn malformed_quote_response_yields_empty_map() {
        assert!(parse_quote_response(&json!({"data": null})).is_empty());
        assert!(parse_quote_response(&json!("nonsense")).is_empty());
    }
}
