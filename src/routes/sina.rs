// src/routes/sina.rs
// 新浪财经, two upstream interfaces: the mobile 724 list (cursor-chained,
// needs the last id of the previous page) and the zhibo live feed (plain
// page numbers, fetched in parallel).
//
// GET /sina/724/{tag?}?limit=20&num=10
// GET /sina/zhibo/{channel?}?limit=20&pagesize=10&tag=A股

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::api::AppState;
use crate::error::AppError;
use crate::feed::{self, FeedEnvelope, FeedItem};
use crate::normalize::{fallback_title, split_bracket_title, strip_repeated_bracket_title, strip_tags};
use crate::paging::{collect_chained, collect_indexed};
use crate::render;

const FEED_LINK: &str = "https://finance.sina.com.cn/7x24/";

// ---------------------------------------------------------------------------
// 724 mobile list
// ---------------------------------------------------------------------------

const NEWS724_API: &str = "https://news.cj.sina.cn/app/v1/news724/list";
const NEWS724_DEFAULT_LIMIT: usize = 20;
const NEWS724_DEFAULT_PER_PAGE: usize = 10;
const NEWS724_FALLBACK_TITLE_CHARS: usize = 100;

/// Tag slug -> upstream numeric tag.
pub static TAG_MAP: &[(&str, u32)] = &[
    ("all", 0),
    ("macro", 1),
    ("stock", 101),
    ("international", 102),
    ("opinion", 6),
];

pub fn tag_id(slug: &str) -> u32 {
    TAG_MAP
        .iter()
        .find(|(s, _)| *s == slug)
        .map(|(_, id)| *id)
        .unwrap_or(0)
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct News724Item {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ctime: serde_json::Value,
    pub url: Option<String>,
    #[serde(default)]
    pub stock: Vec<StockQuote>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StockQuote {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    /// Signed percent string as the provider sends it, e.g. "+1.20%".
    #[serde(default)]
    pub range: String,
}

impl StockQuote {
    fn is_positive(&self) -> bool {
        self.range.starts_with('+')
            || (!self.range.starts_with('-')
                && self.range.trim_end_matches('%').parse::<f64>().unwrap_or(0.0) > 0.0)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct News724Query {
    pub limit: Option<usize>,
    pub num: Option<usize>,
}

/// ctime arrives as epoch seconds from the app endpoint, occasionally as a
/// wall-time string.
fn parse_ctime(v: &serde_json::Value) -> chrono::DateTime<chrono::FixedOffset> {
    match v {
        serde_json::Value::Number(n) => feed::from_epoch_secs(n.as_i64().unwrap_or(0)),
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .ok()
            .map(feed::from_epoch_secs)
            .or_else(|| feed::from_local_str(s))
            .unwrap_or_else(|| feed::from_epoch_secs(0)),
        _ => feed::from_epoch_secs(0),
    }
}

/// 相关行情 block: one line per quoted stock, signed range colored by
/// direction. Quotes without a range render nothing.
fn quote_lines(stocks: &[StockQuote]) -> String {
    let lines: String = stocks
        .iter()
        .filter(|s| !s.range.is_empty())
        .map(|s| {
            let (color, arrow) = if s.is_positive() {
                ("#f5222d", "↑")
            } else {
                ("#52c41a", "↓")
            };
            let code = if s.code.is_empty() {
                String::new()
            } else {
                format!(" <span style=\"color: #999;\">({})</span>", s.code)
            };
            format!(
                "<div style=\"margin: 6px 0;\">• <strong>{}</strong>{code}\
                 <br><span style=\"margin-left: 12px; color: {color}; font-weight: bold;\">{arrow} {}</span></div>",
                s.name, s.range
            )
        })
        .collect();
    if lines.is_empty() {
        String::new()
    } else {
        format!(
            "<br><p style=\"font-weight: bold; margin: 8px 0 4px 0;\">相关行情</p>{lines}"
        )
    }
}

fn map_724_item(item: &News724Item) -> FeedItem {
    let plain = strip_tags(&item.content);
    let title = if plain.is_empty() {
        format!("财经快讯 {}", item.id)
    } else {
        fallback_title(&item.content, NEWS724_FALLBACK_TITLE_CHARS)
    };

    let mut description = item.content.clone();
    description.push_str(&quote_lines(&item.stock));

    let categories: Vec<String> = item
        .stock
        .iter()
        .filter(|s| !s.name.is_empty())
        .map(|s| {
            if s.code.is_empty() {
                format!("{}{}", s.name, s.range)
            } else {
                format!("{}({}){}", s.name, s.code, s.range)
            }
        })
        .collect();

    FeedItem {
        title,
        link: item
            .url
            .clone()
            .unwrap_or_else(|| format!("https://news.cj.sina.cn/7x24/{}", item.id)),
        description,
        pub_date: parse_ctime(&item.ctime),
        guid: format!("sina-724-{}", item.id),
        categories,
        author: Some("新浪财经".to_string()),
        image: None,
        enclosure: None,
    }
}

pub fn build_724_feed(items: &[News724Item], tag_slug: &str) -> FeedEnvelope {
    let mapped: Vec<FeedItem> = items.iter().map(map_724_item).collect();
    counter!("feed_items_total").increment(mapped.len() as u64);

    let label = if tag_slug.is_empty() || tag_slug == "all" {
        "全部"
    } else {
        tag_slug
    };
    FeedEnvelope::new(format!("新浪财经724 - {label}快讯"), FEED_LINK)
        .with_description("新浪财经724移动端接口实时财经快讯")
        .with_items(mapped)
}

pub async fn news724(
    State(state): State<AppState>,
    tag: Option<Path<String>>,
    Query(query): Query<News724Query>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let tag_slug = tag.map(|Path(t)| t).unwrap_or_default();
    let limit = query.limit.unwrap_or(NEWS724_DEFAULT_LIMIT);
    let per_page = query.num.unwrap_or(NEWS724_DEFAULT_PER_PAGE).clamp(5, 30);
    let max_pages = limit.div_ceil(per_page).max(1);

    let tag_num = tag_id(&tag_slug);
    // The app endpoint wants a stable-looking device id; any hex string
    // works, it just has to be present.
    let device_id = format!(
        "{:032x}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    );
    let user_agent = format!("sinafinance__9.0.1__iOS__{device_id}__26.0.1__iPhone18,2");
    let cookie = format!("genTime={}; vt=4; wm=b122", chrono::Utc::now().timestamp());

    let t0 = std::time::Instant::now();
    let client = state.client.clone();
    let items: Vec<News724Item> = collect_chained(
        move |cursor| {
            let client = client.clone();
            let device_id = device_id.clone();
            let user_agent = user_agent.clone();
            let cookie = cookie.clone();
            async move {
                let mut params = vec![
                    ("deviceid", device_id),
                    ("version", "9.0.1".to_string()),
                    ("num", per_page.to_string()),
                    ("tag", tag_num.to_string()),
                    ("dire", "b".to_string()),
                ];
                if let Some(id) = cursor {
                    params.push(("id", id));
                }
                let raw = client
                    .get_json(
                        NEWS724_API,
                        &params,
                        &[("User-Agent", user_agent.as_str()), ("Cookie", cookie.as_str())],
                    )
                    .await?;
                let batch = raw
                    .pointer("/result/data/data")
                    .cloned()
                    .map(serde_json::from_value::<Vec<News724Item>>)
                    .transpose()?
                    .unwrap_or_default();
                Ok(batch)
            }
        },
        |item: &News724Item| item.id.to_string(),
        limit,
        max_pages,
    )
    .await;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    if items.is_empty() {
        return Err(AppError::upstream(anyhow::anyhow!(
            "sina 724 returned no items"
        )));
    }
    Ok(Json(build_724_feed(&items, &tag_slug)))
}

// ---------------------------------------------------------------------------
// zhibo live feed
// ---------------------------------------------------------------------------

const ZHIBO_API: &str = "https://zhibo.sina.com.cn/api/zhibo/feed";
const ZHIBO_DEFAULT_CHANNEL: &str = "152";
const ZHIBO_DEFAULT_LIMIT: usize = 20;
const ZHIBO_PAGE_CAP: usize = 10;
const ZHIBO_FALLBACK_TITLE_CHARS: usize = 80;

/// Channel id -> display label.
pub static CHANNELS: &[(&str, &str)] = &[
    ("151", "政经"),
    ("152", "财经"),
    ("153", "综合"),
    ("155", "市场"),
    ("164", "国际"),
    ("242", "行业"),
];

pub fn channel_label(id: &str) -> &'static str {
    CHANNELS
        .iter()
        .find(|(c, _)| *c == id)
        .map(|(_, label)| *label)
        .unwrap_or("财经")
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ZhiboItem {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub rich_text: String,
    #[serde(default)]
    pub create_time: String,
    pub update_time: Option<String>,
    pub creator: Option<String>,
    pub anchor: Option<String>,
    pub anchor_image_url: Option<String>,
    pub docurl: Option<String>,
    pub multimedia: Option<String>,
    #[serde(default)]
    pub tag: Vec<ZhiboTag>,
    pub like_nums: Option<i64>,
    pub comment_list: Option<CommentList>,
    /// JSON-in-a-string with docurl and stock mentions; parse failures are
    /// treated as absent.
    pub ext: Option<String>,
    pub is_focus: Option<i64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ZhiboTag {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CommentList {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize, Default)]
struct ZhiboExt {
    docurl: Option<String>,
    #[serde(default)]
    stocks: Vec<ZhiboExtStock>,
}

#[derive(Debug, Deserialize, Default, Clone)]
struct ZhiboExtStock {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ZhiboQuery {
    pub limit: Option<usize>,
    pub pagesize: Option<usize>,
    pub tag: Option<String>,
    pub dire: Option<String>,
    pub dpc: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ZhiboOptions {
    pub channel: String,
    pub limit: usize,
    pub focus_only: bool,
    pub tag_filter: Option<String>,
}

fn img_src_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).unwrap())
}

fn extract_images(item: &ZhiboItem) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    for source in [item.multimedia.as_deref(), Some(item.rich_text.as_str())]
        .into_iter()
        .flatten()
    {
        for caps in img_src_re().captures_iter(source) {
            let src = caps[1].to_string();
            if !images.contains(&src) {
                images.push(src);
            }
        }
    }
    images
}

fn parse_ext(item: &ZhiboItem) -> (Option<String>, Vec<String>) {
    let Some(raw) = item.ext.as_deref() else {
        return (None, Vec::new());
    };
    match serde_json::from_str::<ZhiboExt>(raw) {
        Ok(ext) => {
            let link = ext
                .docurl
                .map(|u| u.replacen("http://", "https://", 1));
            let stocks = ext.stocks.into_iter().map(|s| s.key).collect();
            (link, stocks)
        }
        Err(_) => (None, Vec::new()),
    }
}

fn zhibo_kind_label(kind: i64) -> Option<&'static str> {
    match kind {
        0 => Some("普通新闻"),
        3 => Some("多媒体"),
        9 => Some("其他类型"),
        _ => None,
    }
}

fn map_zhibo_item(item: &ZhiboItem) -> FeedItem {
    let plain = strip_tags(&item.rich_text);
    let title = match split_bracket_title(&plain) {
        Some((title, _)) => title,
        None if !plain.is_empty() => fallback_title(&plain, ZHIBO_FALLBACK_TITLE_CHARS),
        None => format!("直播快讯 #{}", item.id),
    };

    let (ext_link, ext_stocks) = parse_ext(item);
    let link = ext_link
        .or_else(|| {
            item.docurl
                .clone()
                .map(|u| u.replacen("http://", "https://", 1))
        })
        .unwrap_or_else(|| FEED_LINK.to_string());

    let images = extract_images(item);

    let body = strip_repeated_bracket_title(&title, item.rich_text.trim());
    let mut description = format!("<div>{body}</div>");
    description.push_str(&render::image_tags(&images));

    let mut meta: Vec<String> = Vec::new();
    if !item.tag.is_empty() {
        let names: Vec<&str> = item.tag.iter().map(|t| t.name.as_str()).collect();
        meta.push(format!("标签：{}", names.join("、")));
    }
    if !ext_stocks.is_empty() {
        meta.push(format!("相关股票：{}", ext_stocks.join("、")));
    }
    if item.like_nums.unwrap_or(0) > 0 {
        meta.push(format!("点赞：{}", item.like_nums.unwrap_or(0)));
    }
    if let Some(comments) = item.comment_list.as_ref().filter(|c| c.total > 0) {
        meta.push(format!("评论：{}", comments.total));
    }
    if let Some(anchor) = item.anchor.as_deref() {
        meta.push(format!("主播：{anchor}"));
    }
    if let Some(updated) = item
        .update_time
        .as_deref()
        .filter(|u| *u != item.create_time)
    {
        meta.push(format!("更新时间：{updated}"));
    }
    if !meta.is_empty() {
        description.push_str(&format!(
            "<br><small style=\"color:#999;\">{}</small>",
            meta.join(" | ")
        ));
    }

    let mut categories: Vec<String> = item.tag.iter().map(|t| t.name.clone()).collect();
    categories.extend(ext_stocks);
    if let Some(label) = zhibo_kind_label(item.kind) {
        categories.push(label.to_string());
    }
    if item.is_focus == Some(1) {
        categories.push("焦点".to_string());
    }

    let author = item.anchor.clone().or_else(|| {
        item.creator.as_deref().map(|c| {
            c.replace("@staff.sina.com.cn", "")
                .replace("@staff.sina.com", "")
        })
    });

    FeedItem {
        title,
        link,
        description,
        pub_date: feed::from_local_str(&item.create_time)
            .unwrap_or_else(|| feed::from_epoch_secs(0)),
        guid: format!("sina-finance-zhibo-{}", item.id),
        categories,
        author: author.filter(|a| !a.is_empty()).or_else(|| Some("新浪财经".to_string())),
        image: item
            .anchor_image_url
            .clone()
            .filter(|u| !u.is_empty())
            .or_else(|| images.first().cloned()),
        enclosure: None,
    }
}

pub fn build_zhibo_feed(collected: &[ZhiboItem], opts: &ZhiboOptions) -> FeedEnvelope {
    let mut kept: Vec<&ZhiboItem> = collected.iter().collect();
    if opts.focus_only {
        kept.retain(|item| item.is_focus == Some(1));
    }
    if let Some(filter) = opts.tag_filter.as_deref() {
        kept.retain(|item| {
            item.tag.iter().any(|t| {
                t.name == filter
                    || t.id.as_str() == Some(filter)
                    || t.name.contains(filter)
            })
        });
    }
    kept.truncate(opts.limit);

    let items: Vec<FeedItem> = kept.iter().map(|i| map_zhibo_item(i)).collect();
    counter!("feed_items_total").increment(items.len() as u64);

    let channel = channel_label(&opts.channel);
    let title = feed::title_with_suffixes(
        &format!("新浪财经 - 7×24直播 - {channel}"),
        &[
            opts.focus_only.then_some("焦点"),
            opts.tag_filter.as_deref(),
        ],
    );

    let mut description = format!("新浪财经7×24小时实时财经直播，{channel}频道专业解读");
    if opts.focus_only {
        description.push_str("，仅展示【焦点新闻】");
    }
    if let Some(filter) = opts.tag_filter.as_deref() {
        description.push_str(&format!("，聚焦【{filter}】"));
    }
    description.push_str(&format!("\n\n• 新闻条数：{}条", items.len()));

    let mut env = FeedEnvelope::new(title, FEED_LINK)
        .with_description(description)
        .with_items(items);
    env.author = Some("新浪财经".to_string());
    env.image = Some("https://finance.sina.com.cn/favicon.ico".to_string());
    env
}

pub async fn zhibo(
    State(state): State<AppState>,
    channel: Option<Path<String>>,
    Query(query): Query<ZhiboQuery>,
) -> Result<Json<FeedEnvelope>, AppError> {
    let channel_param = channel
        .map(|Path(c)| c)
        .unwrap_or_else(|| ZHIBO_DEFAULT_CHANNEL.to_string());
    let focus_only = channel_param == "focus";
    let channel_id = if focus_only {
        ZHIBO_DEFAULT_CHANNEL.to_string()
    } else {
        channel_param
    };

    let limit = query.limit.unwrap_or(ZHIBO_DEFAULT_LIMIT);
    let page_size = query
        .pagesize
        .unwrap_or(ZHIBO_PAGE_CAP)
        .clamp(1, ZHIBO_PAGE_CAP);
    let max_pages = limit.div_ceil(page_size).max(1);
    let dire = query.dire.clone().unwrap_or_else(|| "f".to_string());
    let dpc = query.dpc.clone().unwrap_or_else(|| "1".to_string());

    let t0 = std::time::Instant::now();
    let client = state.client.clone();
    let channel_for_fetch = channel_id.clone();
    let mut collected: Vec<ZhiboItem> = collect_indexed(
        move |page| {
            let client = client.clone();
            let channel = channel_for_fetch.clone();
            let dire = dire.clone();
            let dpc = dpc.clone();
            async move {
                let raw = client
                    .get_json(
                        ZHIBO_API,
                        &[
                            ("zhibo_id", channel),
                            ("page_size", page_size.to_string()),
                            ("pagesize", page_size.to_string()),
                            // Tag filtering happens client-side over the
                            // unfiltered list.
                            ("tag_id", "0".to_string()),
                            ("dire", dire),
                            ("dpc", dpc),
                            ("page", page.to_string()),
                        ],
                        &[],
                    )
                    .await?;
                let batch = raw
                    .pointer("/result/data/feed/list")
                    .cloned()
                    .map(serde_json::from_value::<Vec<ZhiboItem>>)
                    .transpose()?
                    .unwrap_or_default();
                Ok(batch)
            }
        },
        max_pages,
    )
    .await;
    metrics::histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    // Overfetch margin so focus/tag filters still fill the requested limit.
    collected.truncate(limit * 2);

    let opts = ZhiboOptions {
        channel: channel_id,
        limit,
        focus_only,
        tag_filter: query.tag.filter(|t| !t.is_empty()),
    };
    Ok(Json(build_zhibo_feed(&collected, &opts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture_724() -> Vec<News724Item> {
        serde_json::from_value(json!([
            {
                "id": 9001,
                "content": "央行开展逆回购操作。",
                "ctime": 1_700_000_000,
                "stock": [
                    { "name": "贵州茅台", "code": "sh600519", "range": "+1.20%" },
                    { "name": "宁德时代", "code": "sz300750", "range": "-0.50%" }
                ]
            },
            {
                "id": 9002,
                "content": "",
                "ctime": "2024-03-01 09:30:00"
            }
        ]))
        .unwrap()
    }

    #[test]
    fn quote_block_colors_follow_sign() {
        let env = build_724_feed(&fixture_724(), "all");
        let d = &env.items[0].description;
        assert!(d.contains("相关行情"));
        assert!(d.contains("↑ +1.20%"));
        assert!(d.contains("#f5222d"));
        assert!(d.contains("↓ -0.50%"));
        assert!(d.contains("#52c41a"));
    }

    #[test]
    fn quote_categories_bundle_name_code_range() {
        let env = build_724_feed(&fixture_724(), "all");
        assert_eq!(
            env.items[0].categories,
            vec!["贵州茅台(sh600519)+1.20%", "宁德时代(sz300750)-0.50%"]
        );
    }

    #[test]
    fn empty_content_titles_by_id() {
        let env = build_724_feed(&fixture_724(), "all");
        assert_eq!(env.items[1].title, "财经快讯 9002");
    }

    #[test]
    fn ctime_accepts_epoch_and_wall_time() {
        let env = build_724_feed(&fixture_724(), "all");
        assert_eq!(env.items[0].pub_date.timestamp(), 1_700_000_000);
        assert_eq!(env.items[1].pub_date.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn tag_slugs_resolve_to_upstream_ids() {
        assert_eq!(tag_id("stock"), 101);
        assert_eq!(tag_id("opinion"), 6);
        assert_eq!(tag_id("unknown"), 0);
        assert_eq!(tag_id(""), 0);
    }

    fn fixture_zhibo() -> Vec<ZhiboItem> {
        serde_json::from_value(json!([
            {
                "id": 41,
                "type": 0,
                "rich_text": "【盘面异动】两市成交放量。<img src=\"https://img.test/z.png\">",
                "create_time": "2024-03-01 10:00:00",
                "creator": "analyst@staff.sina.com.cn",
                "tag": [{ "id": "10", "name": "A股" }],
                "is_focus": 1,
                "like_nums": 3,
                "ext": "{\"docurl\":\"http://finance.sina.com.cn/doc/41\",\"stocks\":[{\"market\":\"cn\",\"symbol\":\"sh600519\",\"key\":\"贵州茅台\"}]}"
            },
            {
                "id": 42,
                "type": 3,
                "rich_text": "简短直播内容。",
                "create_time": "2024-03-01 10:01:00",
                "ext": "{broken json"
            }
        ]))
        .unwrap()
    }

    fn zhibo_opts() -> ZhiboOptions {
        ZhiboOptions {
            channel: "152".to_string(),
            limit: ZHIBO_DEFAULT_LIMIT,
            focus_only: false,
            tag_filter: None,
        }
    }

    #[test]
    fn ext_docurl_upgrades_to_https() {
        let env = build_zhibo_feed(&fixture_zhibo(), &zhibo_opts());
        assert_eq!(env.items[0].link, "https://finance.sina.com.cn/doc/41");
    }

    #[test]
    fn broken_ext_json_degrades_to_feed_link() {
        let env = build_zhibo_feed(&fixture_zhibo(), &zhibo_opts());
        assert_eq!(env.items[1].link, FEED_LINK);
    }

    #[test]
    fn categories_merge_tags_stocks_type_and_focus() {
        let env = build_zhibo_feed(&fixture_zhibo(), &zhibo_opts());
        assert_eq!(
            env.items[0].categories,
            vec!["A股", "贵州茅台", "普通新闻", "焦点"]
        );
        assert_eq!(env.items[1].categories, vec!["多媒体"]);
    }

    #[test]
    fn staff_suffix_is_stripped_from_creator() {
        let env = build_zhibo_feed(&fixture_zhibo(), &zhibo_opts());
        assert_eq!(env.items[0].author.as_deref(), Some("analyst"));
        assert_eq!(env.items[1].author.as_deref(), Some("新浪财经"));
    }

    #[test]
    fn focus_only_filters_and_suffixes_title() {
        let opts = ZhiboOptions {
            focus_only: true,
            ..zhibo_opts()
        };
        let env = build_zhibo_feed(&fixture_zhibo(), &opts);
        assert_eq!(env.items.len(), 1);
        assert_eq!(env.title, "新浪财经 - 7×24直播 - 财经 - 焦点");
    }

    #[test]
    fn tag_filter_matches_name_id_or_substring() {
        let by_name = ZhiboOptions {
            tag_filter: Some("A股".to_string()),
            ..zhibo_opts()
        };
        assert_eq!(build_zhibo_feed(&fixture_zhibo(), &by_name).items.len(), 1);
        let by_id = ZhiboOptions {
            tag_filter: Some("10".to_string()),
            ..zhibo_opts()
        };
        assert_eq!(build_zhibo_feed(&fixture_zhibo(), &by_id).items.len(), 1);
    }

    #[test]
    fn bracket_title_extracted_and_images_collected() {
        let env = build_zhibo_feed(&fixture_zhibo(), &zhibo_opts());
        let item = &env.items[0];
        assert_eq!(item.title, "盘面异动");
        assert_eq!(item.image.as_deref(), Some("https://img.test/z.png"));
        assert!(item.description.contains("标签：A股"));
        assert!(item.description.contains("相关股票：贵州茅台"));
    }
}
