// src/routes/kaipanla.rs
// 开盘啦 (longhuvip) app endpoints: news flash, market live commentary, and
// the single-item market-strength review. All three go through the shared
// response cache; the app API is rate-limited aggressively.
//
// GET /kaipanla/news/{kind?}     (stock | commodity)
// GET /kaipanla/zhibo/{category?} (全部 | 个股 | 板块 | plate or analyst name)
// GET /kaipanla/review

use axum::extract::{Path, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppError;
use crate::feed::{self, FeedEnvelope, FeedItem};
use crate::instrument::{partition, InstrumentRef, Trend};
use crate::normalize::strip_repeated_bracket_title;
use crate::render;

const HOME_URL: &str = "https://www.longhuvip.com/";
const APP_USER_AGENT: &str = "lhb/5.21.3 (com.kaipanla.www; build:0; iOS 26.0.1) Alamofire/4.9.1";

fn epoch_of(v: &serde_json::Value) -> i64 {
    match v {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Bordered card the app renders the flash body in.
fn content_card(text: &str) -> String {
    format!(
        "<div style=\"padding: 15px; background: #f8f9fa; border-left: 4px solid #1890ff; \
         border-radius: 5px; margin-bottom: 10px;\">\
         <p style=\"margin: 0; line-height: 1.6; color: #333;\">{text}</p></div>"
    )
}

// ---------------------------------------------------------------------------
// news flash
// ---------------------------------------------------------------------------

const NEWS_API: &str = "https://apparticle.longhuvip.com/w1/api/index.php";

#[derive(Debug, Deserialize, Default)]
pub struct NewsResponse {
    #[serde(rename = "List", default)]
    pub list: Vec<NewsItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsItem {
    #[serde(rename = "CID", default)]
    pub cid: serde_json::Value,
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Content", default)]
    pub content: String,
    #[serde(rename = "Time", default)]
    pub time: serde_json::Value,
    #[serde(rename = "PushUrl")]
    pub push_url: Option<String>,
    #[serde(rename = "Source")]
    pub source: Option<String>,
    /// `[code, name, change]` triples.
    #[serde(rename = "Stocks", default)]
    pub stocks: Vec<Vec<String>>,
}

fn news_kind_param(kind: &str) -> &'static str {
    match kind {
        "commodity" => "1",
        _ => "0",
    }
}

fn triple_to_ref(triple: &[String]) -> Option<InstrumentRef> {
    let code = triple.first()?.clone();
    let name = triple.get(1).cloned().unwrap_or_default();
    let change = triple
        .get(2)
        .and_then(|c| c.trim_end_matches('%').parse::<f64>().ok());
    Some(InstrumentRef::new(code, name, change))
}

fn map_news_item(item: &NewsItem) -> FeedItem {
    let title = item.title.trim().to_string();
    let raw_body = if item.content.is_empty() {
        item.title.as_str()
    } else {
        item.content.as_str()
    };
    let body = strip_repeated_bracket_title(&title, raw_body);

    let mut description = content_card(&body);
    let refs: Vec<InstrumentRef> = item.stocks.iter().filter_map(|t| triple_to_ref(t)).collect();
    let (plates, stocks) = partition(refs);
    description.push_str(&render::sector_block(&plates));
    description.push_str(&render::stock_block(&stocks));

    // Categories omit the change so the entry stays stable across fetches.
    let categories: Vec<String> = item
        .stocks
        .iter()
        .filter_map(|t| {
            let code = t.first()?;
            let name = t.get(1)?;
            Some(format!("{name}({code})"))
        })
        .collect();

    FeedItem {
        title,
        link: item
            .push_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| HOME_URL.to_string()),
        description,
        pub_date: feed::from_epoch_secs(epoch_of(&item.time)),
        guid: format!("kaipanla:news:{}", label_of(&item.cid)),
        categories,
        author: Some(item.source.clone().unwrap_or_else(|| "开盘啦".to_string())),
        image: None,
        enclosure: None,
    }
}

fn label_of(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn build_news_feed(resp: &NewsResponse, kind: &str) -> FeedEnvelope {
    let items: Vec<FeedItem> = resp.list.iter().map(map_news_item).collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let kind_name = if kind == "commodity" { "商品期货" } else { "股票" };
    FeedEnvelope::new(format!("开盘啦 - {kind_name}新闻快讯"), HOME_URL)
        .with_description(format!("来自财联社等权威财经媒体的{kind_name}实时资讯"))
        .with_items(items)
}

pub async fn news(
    State(state): State<AppState>,
    kind: Option<Path<String>>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let kind = kind.map(|Path(k)| k).unwrap_or_else(|| "stock".to_string());
    let type_param = news_kind_param(&kind);

    let cache_key = format!("kaipanla:news:{type_param}");
    let client = state.client.clone();
    let raw = state
        .cache
        .try_get(&cache_key, || async move {
            let t0 = std::time::Instant::now();
            let raw = client
                .get_json(
                    NEWS_API,
                    &[
                        ("a", "GetList".to_string()),
                        ("apiv", "w42".to_string()),
                        ("c", "PCNewsFlash".to_string()),
                        ("PhoneOSNew", "2".to_string()),
                        ("VerSion", "5.21.0.3".to_string()),
                        ("Type", type_param.to_string()),
                        ("Index", "0".to_string()),
                        ("NewsID", "0".to_string()),
                        ("st", "30".to_string()),
                    ],
                    &[("User-Agent", APP_USER_AGENT), ("Accept", "*/*")],
                )
                .await?;
            metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            Ok(raw)
        })
        .await
        .map_err(AppError::upstream)?;

    let resp: NewsResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_news_feed(&resp, &kind)))
}

// ---------------------------------------------------------------------------
// market live
// ---------------------------------------------------------------------------

const ZHIBO_API: &str = "https://apphwhq.longhuvip.com/w1/api/index.php";
const ZHIBO_FALLBACK_TITLE_CHARS: usize = 50;
const ZHIBO_STOCK_DISPLAY_CAP: usize = 15;

#[derive(Debug, Deserialize, Default)]
pub struct ZhiboResponse {
    #[serde(rename = "List", default)]
    pub list: Vec<ZhiboItem>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ZhiboItem {
    #[serde(rename = "ID", default)]
    pub id: serde_json::Value,
    #[serde(rename = "Comment", default)]
    pub comment: String,
    #[serde(rename = "Time", default)]
    pub time: serde_json::Value,
    #[serde(rename = "UserName")]
    pub user_name: Option<String>,
    #[serde(rename = "PlateName")]
    pub plate_name: Option<String>,
    #[serde(rename = "PlateZDF")]
    pub plate_zdf: Option<String>,
    #[serde(rename = "PlateJE")]
    pub plate_je: Option<String>,
    /// `[code, name, change]` triples; change is numeric here.
    #[serde(rename = "Stock", default)]
    pub stock: Vec<Vec<serde_json::Value>>,
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "Interpretation")]
    pub interpretation: Option<String>,
    #[serde(rename = "BoomReason")]
    pub boom_reason: Option<String>,
}

impl ZhiboItem {
    fn plate(&self) -> Option<&str> {
        self.plate_name.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

fn analyst_role(name: &str) -> (&'static str, &'static str) {
    match name {
        "Livermore" => ("#ff6b6b", "资深分析师"),
        "xmm" => ("#4ecdc4", "AI智能分析"),
        "xqm" => ("#45b7d1", "市场分析师"),
        _ => ("#95a5a6", "分析师"),
    }
}

fn map_zhibo_item(item: &ZhiboItem) -> FeedItem {
    let plain = item.comment.trim();
    let title = if plain.chars().count() > ZHIBO_FALLBACK_TITLE_CHARS {
        let head: String = plain.chars().take(ZHIBO_FALLBACK_TITLE_CHARS).collect();
        format!("{head}…")
    } else {
        plain.to_string()
    };

    let mut description = String::new();
    if let Some(image) = item.image.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
        description.push_str(&format!(
            "<div style=\"margin-bottom: 15px;\"><img src=\"{image}\" \
             style=\"max-width: 100%; border-radius: 8px;\"/></div>"
        ));
    }
    description.push_str(&content_card(plain));

    if let Some(plate) = item.plate() {
        let zdf = item.plate_zdf.as_deref().and_then(|z| z.parse::<f64>().ok());
        description.push_str(&format!(
            "<div style=\"margin-bottom: 10px;\"><strong>📂 板块：</strong>\
             <span style=\"background: #667eea; color: white; padding: 3px 10px; \
             border-radius: 4px; margin: 0 5px;\">{plate}</span>"
        ));
        if let Some(zdf) = zdf {
            let trend = Trend::from_change(zdf);
            description.push_str(&format!(
                "<span style=\"color: {}; font-weight: bold; font-size: 16px;\">{}{zdf:.2}%</span>",
                trend.color(),
                trend.sign()
            ));
        }
        if let Some(je) = item.plate_je.as_deref().map(str::trim).filter(|j| !j.is_empty()) {
            description.push_str(&format!(
                "<span style=\"color: #999; margin-left: 10px;\">成交额: {je}</span>"
            ));
        }
        description.push_str("</div>");
    }

    if !item.stock.is_empty() {
        description.push_str(&format!(
            "<div style=\"background: white; padding: 12px; border-radius: 5px; \
             margin-bottom: 10px;\"><strong>📊 相关个股 ({}只)：</strong>",
            item.stock.len()
        ));
        for triple in item.stock.iter().take(ZHIBO_STOCK_DISPLAY_CAP) {
            let code = triple.first().map(label_of).unwrap_or_default();
            let name = triple.get(1).map(label_of).unwrap_or_default();
            let change = triple.get(2).and_then(|c| c.as_f64()).unwrap_or(0.0);
            let trend = Trend::from_change(change);
            let emoji = match trend {
                Trend::Up => "🔴",
                Trend::Down => "🟢",
                Trend::Flat => "⚪",
            };
            description.push_str(&format!(
                "<div style=\"padding: 6px 10px; background: #f5f5f5; border-radius: 4px; \
                 font-size: 13px;\">{emoji} <strong>{name}</strong> ({code})<br>\
                 <span style=\"color: {}; font-weight: bold;\">{}{change}%</span></div>",
                trend.color(),
                trend.sign()
            ));
        }
        if item.stock.len() > ZHIBO_STOCK_DISPLAY_CAP {
            description.push_str(&format!(
                "<div style=\"padding: 6px 10px; color: #999;\">...还有{}只</div>",
                item.stock.len() - ZHIBO_STOCK_DISPLAY_CAP
            ));
        }
        description.push_str("</div>");
    }

    if let Some(text) = item.interpretation.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        description.push_str(&format!(
            "<div style=\"background: #e6f7ff; border-left: 4px solid #1890ff; padding: 12px; \
             border-radius: 5px; margin-bottom: 10px;\"><strong>💡 解读：</strong>\
             <p style=\"margin: 5px 0 0 0;\">{text}</p></div>"
        ));
    }
    if let Some(text) = item.boom_reason.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        description.push_str(&format!(
            "<div style=\"background: #fff7e6; border-left: 4px solid #faad14; padding: 12px; \
             border-radius: 5px; margin-bottom: 10px;\"><strong>🔥 爆发原因：</strong>\
             <p style=\"margin: 5px 0 0 0;\">{text}</p></div>"
        ));
    }
    if let Some(user) = item.user_name.as_deref() {
        let (color, role) = analyst_role(user);
        description.push_str(&format!(
            "<div style=\"margin-top: 10px; padding-top: 10px; border-top: 1px solid #e8e8e8;\">\
             <small style=\"color: #666;\">👤 <span style=\"color: {color}; \
             font-weight: bold;\">{user}</span> · <span style=\"color: #999;\">{role}</span>\
             </small></div>"
        ));
    }

    FeedItem {
        title,
        link: HOME_URL.to_string(),
        description,
        pub_date: feed::from_epoch_secs(epoch_of(&item.time)),
        guid: format!("kaipanla:zhibo:{}", label_of(&item.id)),
        categories: item.plate().map(str::to_string).into_iter().collect(),
        author: Some(item.user_name.clone().unwrap_or_else(|| "开盘啦".to_string())),
        image: item.image.clone().filter(|i| !i.trim().is_empty()),
        enclosure: None,
    }
}

pub fn build_zhibo_feed(resp: &ZhiboResponse, category: &str) -> FeedEnvelope {
    let filtered: Vec<&ZhiboItem> = match category {
        "" | "全部" => resp.list.iter().collect(),
        "个股" => resp.list.iter().filter(|i| !i.stock.is_empty()).collect(),
        "板块" => resp.list.iter().filter(|i| i.plate().is_some()).collect(),
        name => resp
            .list
            .iter()
            .filter(|i| i.plate() == Some(name) || i.user_name.as_deref() == Some(name))
            .collect(),
    };

    let items: Vec<FeedItem> = filtered.iter().map(|i| map_zhibo_item(i)).collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let title = match category {
        "" | "全部" => "开盘啦 - 大盘直播".to_string(),
        "个股" => "开盘啦 - 大盘直播 (个股异动)".to_string(),
        "板块" => "开盘啦 - 大盘直播 (板块直播)".to_string(),
        name => format!("开盘啦 - 大盘直播 ({name})"),
    };

    // Whole-list stats, pre-filter, so the summary describes the stream.
    let mut plates: Vec<&str> = Vec::new();
    let mut authors: Vec<&str> = Vec::new();
    let mut with_stocks = 0usize;
    for item in &resp.list {
        if let Some(p) = item.plate() {
            if !plates.contains(&p) {
                plates.push(p);
            }
        }
        if let Some(u) = item.user_name.as_deref() {
            if !authors.contains(&u) {
                authors.push(u);
            }
        }
        if !item.stock.is_empty() {
            with_stocks += 1;
        }
    }
    let mut description =
        "开盘啦大盘直播，AI+资深分析师实时解读市场动态、个股异动、板块轮动。".to_string();
    if !category.is_empty() && category != "全部" {
        description.push_str(&format!("<br><strong>当前筛选：{category}</strong>"));
    }
    description.push_str(&format!("<br><br>• 涉及板块：{}个", plates.len()));
    description.push_str(&format!(
        "<br>• 分析师：{}位 ({})",
        authors.len(),
        authors.join("、")
    ));
    description.push_str(&format!("<br>• 关联个股：{with_stocks}条直播"));

    FeedEnvelope::new(title, HOME_URL)
        .with_description(description)
        .with_items(items)
}

pub async fn zhibo(
    State(state): State<AppState>,
    category: Option<Path<String>>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let category = category.map(|Path(c)| c).unwrap_or_default();

    let client = state.client.clone();
    let raw = state
        .cache
        .try_get("kaipanla:zhibo", || async move {
            let t0 = std::time::Instant::now();
            let raw = client
                .get_json(
                    ZHIBO_API,
                    &[
                        ("a", "ZhiBoContent".to_string()),
                        ("apiv", "w42".to_string()),
                        ("c", "ConceptionPoint".to_string()),
                        ("PhoneOSNew", "2".to_string()),
                        ("VerSion", "5.21.0.3".to_string()),
                    ],
                    &[("User-Agent", APP_USER_AGENT), ("Accept", "*/*")],
                )
                .await?;
            metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            Ok(raw)
        })
        .await
        .map_err(AppError::upstream)?;

    let resp: ZhiboResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_zhibo_feed(&resp, &category)))
}

// ---------------------------------------------------------------------------
// market-strength review
// ---------------------------------------------------------------------------

const REVIEW_API: &str = "https://apphq.longhuvip.com/w1/api/index.php";

#[derive(Debug, Deserialize, Default)]
pub struct ReviewResponse {
    #[serde(default)]
    pub info: ReviewInfo,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReviewInfo {
    #[serde(default)]
    pub strong: serde_json::Value,
    #[serde(default)]
    pub sign: String,
}

/// Strength-score band with the app's emoji convention.
pub fn sentiment_band(strong: i64) -> (&'static str, &'static str) {
    if strong >= 80 {
        ("🔥", "极强")
    } else if strong >= 60 {
        ("💪", "偏强")
    } else if strong >= 40 {
        ("😐", "中性")
    } else {
        ("😟", "偏弱")
    }
}

pub fn build_review_feed(resp: &ReviewResponse) -> FeedEnvelope {
    let strong = epoch_of(&resp.info.strong);
    let (emoji, sentiment) = sentiment_band(strong);

    let title = format!("{emoji} 市场情绪：{sentiment} ({strong}分)");
    let description = format!(
        "<div style=\"padding: 15px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); \
         color: white; border-radius: 10px; margin-bottom: 10px;\">\
         <h2 style=\"margin: 0 0 10px 0; color: white;\">📊 市场综合强度</h2>\
         <div style=\"font-size: 48px; font-weight: bold; text-align: center; margin: 20px 0;\">{strong}分</div>\
         <div style=\"text-align: center; font-size: 24px; margin: 10px 0;\">{emoji} {sentiment}</div></div>\
         <div style=\"padding: 15px; background: #f8f9fa; border-left: 4px solid #667eea; border-radius: 5px;\">\
         <h3 style=\"margin-top: 0; color: #333;\">💡 盘面点评</h3>\
         <p style=\"font-size: 16px; line-height: 1.6; color: #555;\">{}</p></div>",
        resp.info.sign
    );

    let now = chrono::Utc::now().with_timezone(&feed::cst());
    let item = FeedItem {
        title,
        link: HOME_URL.to_string(),
        description,
        pub_date: now,
        guid: format!("kaipanla:review:{}", now.timestamp()),
        categories: Vec::new(),
        author: Some("开盘啦".to_string()),
        image: None,
        enclosure: None,
    };
    counter!("feed_items_total").increment(1);

    FeedEnvelope::new("开盘啦 - 盘面点评", HOME_URL)
        .with_description("实时市场情绪评分和盘面点评")
        .with_items(vec![item])
}

pub async fn review(State(state): State<AppState>) -> Result<Json<FeedEnvelope>, AppError> {
    let client = state.client.clone();
    let raw = state
        .cache
        .try_get("kaipanla:review", || async move {
            let t0 = std::time::Instant::now();
            let raw = client
                .get_json(
                    REVIEW_API,
                    &[
                        ("a", "DiskReview".to_string()),
                        ("apiv", "w21".to_string()),
                        ("c", "HomeDingPan".to_string()),
                        ("PhoneOSNew", "1".to_string()),
                    ],
                    &[("User-Agent", APP_USER_AGENT), ("Accept", "*/*")],
                )
                .await?;
            metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            Ok(raw)
        })
        .await
        .map_err(AppError::upstream)?;

    let resp: ReviewResponse = serde_json::from_value(raw).unwrap_or_default();
    Ok(Json(build_review_feed(&resp)))
}
