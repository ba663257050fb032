// src/routes/tencent.rs
// 腾讯自选股 flash list. The gateway checks a request signature; the fixed
// parameter set below is a captured web-app session and caps the list at 10
// entries. Quote data comes from the qt.gtimg.cn text protocol and is
// optional.
//
// GET /tencent/newslist?limit=10

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::api::AppState;
use crate::client::ProviderClient;
use crate::error::AppError;
use crate::feed::{self, FeedEnvelope, FeedItem};
use crate::instrument::{InstrumentKind, InstrumentRef};
use crate::render;

const HOME_URL: &str = "https://gu.qq.com";
const LIST_API: &str = "https://snp.tenpay.com/cgi-bin/snpgw_724_newslist.fcgi";
const QUOTE_API: &str = "https://qt.gtimg.cn/q=";
const MAX_ITEMS: usize = 10;
const FALLBACK_TITLE_CHARS: usize = 100;

/// Captured session parameters. The sign expires eventually; when the
/// gateway starts answering with a non-zero retcode this set needs to be
/// re-captured.
fn fixed_params() -> Vec<(&'static str, String)> {
    [
        ("reserve", "2149056560"),
        ("filter", "0"),
        ("limit", "10"),
        ("offset", "0"),
        ("hot_label", "0"),
        ("req_session", "0"),
        ("zappid", "zxg_h5"),
        ("sign", "116148801e817c775f5e31565bd8a8c1"),
        ("nonce", "8431"),
        ("_appver", "11.32.0"),
        ("_devId", "7e8ba3a8ed2491b4c906dbb430e86b887acc5c7e"),
        ("check", "-1"),
        ("_ui", "7e8ba3a8ed2491b4c906dbb430e86b887acc5c7e"),
        ("fskey", "anonymous"),
        ("_appName", "ios"),
        ("openid", "anonymous"),
        ("buildType", "store"),
        ("_osVer", "26.0.1"),
        ("_dev", "iPhone18,2"),
        ("lang", "en_US"),
        ("_isChId", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect()
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsListResponse {
    #[serde(default)]
    pub retcode: String,
    pub retmsg: Option<String>,
    #[serde(default)]
    pub hot_label: Vec<HotLabel>,
    #[serde(default)]
    pub data: Vec<NewsItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HotLabel {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsItem {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub content: String,
    pub new_content: Option<String>,
    pub new_title: Option<String>,
    #[serde(default)]
    pub publish_time: i64,
    pub url: Option<String>,
    #[serde(default)]
    pub relate_stocks: Vec<RelatedStock>,
    #[serde(default)]
    pub label_list: Vec<NewsLabel>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RelatedStock {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsLabel {
    #[serde(default)]
    pub label_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct QuoteInfo {
    pub name: String,
    pub change: f64,
}

pub type QuoteMap = HashMap<String, QuoteInfo>;

#[derive(Debug, Deserialize, Default)]
pub struct NewsListQuery {
    pub limit: Option<usize>,
}

fn quote_line_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r#"v_([^=]+)="([^"]+)""#).unwrap())
}

fn stock_anchor_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"<a[^>]*href\s*=\s*"stock://[^"]*"[^>]*>([^<]+)</a>"#).unwrap()
    })
}

fn bracket_anywhere_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"【([^】]+)】").unwrap())
}

/// Parse the qt.gtimg.cn text protocol: one `v_<code>="f0~f1~..."` line per
/// instrument, field 1 the name, field 32 (fallback 5) the percent change.
pub fn parse_quote_text(body: &str) -> QuoteMap {
    let mut map = QuoteMap::new();
    for caps in quote_line_re().captures_iter(body) {
        let code = caps[1].to_string();
        let fields: Vec<&str> = caps[2].split('~').collect();
        if fields.len() <= 5 {
            continue;
        }
        let change = fields
            .get(32)
            .filter(|f| !f.is_empty())
            .or_else(|| fields.get(5))
            .and_then(|f| f.parse::<f64>().ok())
            .unwrap_or(0.0);
        map.insert(
            code,
            QuoteInfo {
                name: fields[1].to_string(),
                change,
            },
        );
    }
    map
}

async fn fetch_quotes(client: &ProviderClient, codes: &[String]) -> QuoteMap {
    if codes.is_empty() {
        return QuoteMap::new();
    }
    let url = format!("{QUOTE_API}{}", codes.join(","));
    match client
        .get_text(&url, &[], &[("Referer", "https://gu.qq.com/")])
        .await
    {
        Ok(body) => parse_quote_text(&body),
        Err(e) => {
            tracing::warn!(error = ?e, "quote lookup failed, continuing without");
            counter!("feed_enrichment_errors_total").increment(1);
            QuoteMap::new()
        }
    }
}

fn item_id(item: &NewsItem) -> String {
    match &item.id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_item(item: &NewsItem, quotes: &QuoteMap) -> FeedItem {
    let content = item.new_content.as_deref().unwrap_or(&item.content);
    let id = item_id(item);

    let title = item
        .new_title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| {
            let clean = crate::normalize::strip_tags(content);
            match bracket_anywhere_re().captures(&clean) {
                Some(caps) => caps[1].to_string(),
                None if !clean.is_empty() => clean.chars().take(FALLBACK_TITLE_CHARS).collect(),
                None => format!("财经快讯 {id}"),
            }
        });

    // Drop the first bracket headline and downgrade stock:// anchors to
    // emphasis; feed readers cannot open the app protocol anyway.
    let mut body = bracket_anywhere_re().replacen(content, 1, "").trim().to_string();
    body = stock_anchor_re()
        .replace_all(&body, "<em><strong>$1</strong></em>")
        .into_owned();

    let mut description = format!(
        "<div style=\"padding: 15px; background: #f8f9fa; border-left: 4px solid #667eea; \
         border-radius: 5px; margin-bottom: 10px;\">\
         <p style=\"margin: 0; line-height: 1.8; font-size: 15px;\">{body}</p></div>"
    );

    // Only mentions with live quote data make it into the blocks.
    let refs: Vec<InstrumentRef> = item
        .relate_stocks
        .iter()
        .filter_map(|stock| {
            let info = quotes.get(&stock.symbol)?;
            let name = if stock.name.is_empty() {
                info.name.clone()
            } else {
                stock.name.clone()
            };
            Some(InstrumentRef::new(
                stock.symbol.clone(),
                name,
                Some(info.change),
            ))
        })
        .collect();
    let (sectors, stocks): (Vec<_>, Vec<_>) =
        refs.into_iter().partition(|r| r.kind == InstrumentKind::Sector);
    description.push_str(&render::sector_block(&sectors));
    description.push_str(&render::stock_block(&stocks));

    let mut categories: Vec<String> = item
        .label_list
        .iter()
        .map(|l| l.label_name.clone())
        .collect();
    categories.extend(
        item.relate_stocks
            .iter()
            .map(|s| s.name.clone())
            .filter(|n| !n.is_empty()),
    );

    FeedItem {
        title,
        link: item
            .url
            .clone()
            .unwrap_or_else(|| format!("{HOME_URL}/news/{id}")),
        description,
        pub_date: feed::from_epoch_secs(item.publish_time),
        guid: format!("tencent-zxg-{id}"),
        categories,
        author: Some("腾讯自选股".to_string()),
        image: None,
        enclosure: None,
    }
}

pub fn build_feed(resp: &NewsListResponse, quotes: &QuoteMap, limit: usize) -> FeedEnvelope {
    let items: Vec<FeedItem> = resp
        .data
        .iter()
        .take(limit.min(MAX_ITEMS))
        .map(|i| map_item(i, quotes))
        .collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let mut title = "腾讯自选股 - 财经快讯".to_string();
    if !resp.hot_label.is_empty() {
        let names: Vec<&str> = resp.hot_label.iter().map(|l| l.name.as_str()).collect();
        title.push_str(&format!(" - 热门: {}", names.join("、")));
    }

    let mut env = FeedEnvelope::new(title, format!("{HOME_URL}/"))
        .with_description("腾讯自选股实时财经快讯")
        .with_items(items);
    env.language = "zh-CN".to_string();
    env.author = Some("腾讯自选股".to_string());
    env.image = Some(format!("{HOME_URL}/favicon.ico"));
    env
}

pub async fn newslist(
    State(state): State<AppState>,
    Query(query): Query<NewsListQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let limit = query.limit.unwrap_or(MAX_ITEMS);

    let t0 = std::time::Instant::now();
    let raw = state
        .client
        .get_json(
            LIST_API,
            &fixed_params(),
            &[
                ("User-Agent", "QQStock/11.32.0 (iPhone; iOS 26.0.1; Scale/3.00)"),
                ("Referer", "http://zixuanguapp.finance.qq.com"),
                ("Accept", "*/*"),
            ],
        )
        .await
        .map_err(AppError::upstream)?;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let resp: NewsListResponse = serde_json::from_value(raw).unwrap_or_default();
    if resp.retcode != "0" {
        return Err(AppError::upstream(anyhow::anyhow!(
            "tencent gateway rejected the request: retcode={} retmsg={}",
            resp.retcode,
            resp.retmsg.as_deref().unwrap_or("unknown")
        )));
    }

    let mut codes: Vec<String> = Vec::new();
    for item in resp.data.iter().take(limit.min(MAX_ITEMS)) {
        for stock in &item.relate_stocks {
            if !stock.symbol.is_empty() && !codes.contains(&stock.symbol) {
                codes.push(stock.symbol.clone());
            }
        }
    }
    let quotes = fetch_quotes(&state.client, &codes).await;

    Ok(Json(build_feed(&resp, &quotes, limit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> NewsListResponse {
        serde_json::from_value(json!({
            "retcode": "0",
            "hot_label": [{ "name": "AI" }, { "name": "芯片" }],
            "data": [
                {
                    "id": "n1",
                    "content": "【芯片大涨】板块全线走强，<a class=\"s\" href = \"stock://sh600519\">贵州茅台</a>亦强。",
                    "publish_time": 1_700_000_000,
                    "relate_stocks": [
                        { "symbol": "cs931071", "name": "人工智能" },
                        { "symbol": "sh600519", "name": "贵州茅台" },
                        { "symbol": "pt02GN2162", "name": "钒电池" }
                    ],
                    "label_list": [{ "label_name": "热点" }]
                },
                {
                    "id": "n2",
                    "new_title": "接口标题",
                    "content": "无括号正文。",
                    "publish_time": 1_700_000_060
                }
            ]
        }))
        .unwrap()
    }

    fn quote_line(code: &str, name: &str, change_f5: &str, change_f32: Option<&str>) -> String {
        let mut fields = vec!["51", name, "000000", "10.0", "9.9", change_f5];
        if let Some(c32) = change_f32 {
            fields.extend(std::iter::repeat("").take(26));
            fields.push(c32);
        }
        format!("v_{code}=\"{}\";", fields.join("~"))
    }

    fn quotes() -> QuoteMap {
        let body = format!(
            "{}\n{}",
            quote_line("cs931071", "人工智能", "0.00", Some("1.80")),
            quote_line("sh600519", "贵州茅台", "-0.30", None),
        );
        parse_quote_text(&body)
    }

    #[test]
    fn quote_text_protocol_prefers_field_32_then_5() {
        let q = quotes();
        assert_eq!(q["cs931071"].name, "人工智能");
        assert_eq!(q["cs931071"].change, 1.8);
        assert_eq!(q["sh600519"].change, -0.3);
    }

    #[test]
    fn bracket_title_and_stock_anchor_rewrite() {
        let env = build_feed(&fixture(), &quotes(), MAX_ITEMS);
        let item = &env.items[0];
        assert_eq!(item.title, "芯片大涨");
        assert!(item.description.contains("<em><strong>贵州茅台</strong></em>"));
        assert!(!item.description.contains("stock://"));
        assert!(!item.description.contains("【芯片大涨】"));
    }

    #[test]
    fn mentions_without_quote_data_are_omitted() {
        let env = build_feed(&fixture(), &quotes(), MAX_ITEMS);
        let d = &env.items[0].description;
        // cs prefix is a sector, sh is a stock, pt has no quote line.
        assert!(d.contains("相关板块"));
        assert!(d.contains("(CS931071)"));
        assert!(d.contains("相关股票"));
        assert!(!d.contains("钒电池"));
    }

    #[test]
    fn categories_merge_labels_and_stock_names() {
        let env = build_feed(&fixture(), &quotes(), MAX_ITEMS);
        assert_eq!(
            env.items[0].categories,
            vec!["热点", "人工智能", "贵州茅台", "钒电池"]
        );
    }

    #[test]
    fn explicit_title_wins_over_extraction() {
        let env = build_feed(&fixture(), &quotes(), MAX_ITEMS);
        assert_eq!(env.items[1].title, "接口标题");
        assert_eq!(env.items[1].guid, "tencent-zxg-n2");
    }

    #[test]
    fn hot_labels_suffix_feed_title_and_limit_caps_at_ten() {
        let env = build_feed(&fixture(), &quotes(), 50);
        assert_eq!(env.title, "腾讯自选股 - 财经快讯 - 热门: AI、芯片");
        assert!(env.items.len() <= MAX_ITEMS);
        let env = build_feed(&fixture(), &quotes(), 1);
        assert_eq!(env.items.len(), 1);
    }
}
