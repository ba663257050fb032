// src/feed.rs
// Canonical feed shapes shared by every route: one envelope per request,
// items kept in provider order.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::Serialize;

/// Timezone every provider timestamp is normalized into (Beijing, UTC+8).
pub fn cst() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

/// Epoch seconds -> UTC+8 wall time. Out-of-range values clamp to epoch.
pub fn from_epoch_secs(secs: i64) -> DateTime<FixedOffset> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
        .with_timezone(&cst())
}

/// Provider-local `YYYY-MM-DD HH:MM:SS` strings are already Beijing time.
pub fn from_local_str(s: &str) -> Option<DateTime<FixedOffset>> {
    chrono::NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
        .ok()
        .and_then(|naive| cst().from_local_datetime(&naive).single())
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: String,
}

impl Enclosure {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: "audio/mpeg".to_string(),
        }
    }
}

/// One normalized feed entry. Immutable once built; serialized straight into
/// the route response.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<FixedOffset>,
    pub guid: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<Enclosure>,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: String::new(),
            pub_date: from_epoch_secs(0),
            guid: String::new(),
            categories: Vec::new(),
            author: None,
            image: None,
            enclosure: None,
        }
    }

    /// Replace the category list with a deduplicated copy. Set semantics,
    /// first occurrence wins, order preserved.
    pub fn dedup_categories(mut self) -> Self {
        self.categories = dedup_preserving_order(self.categories);
        self
    }
}

/// Top-level structure a route returns; no lifecycle beyond the request.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEnvelope {
    pub title: String,
    pub link: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub items: Vec<FeedItem>,
}

impl FeedEnvelope {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            language: "zh-cn".to_string(),
            description: None,
            author: None,
            image: None,
            items: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach items, deduplicating each item's categories on the way in.
    /// Provider order is kept as given; nothing re-sorts.
    pub fn with_items(mut self, items: Vec<FeedItem>) -> Self {
        self.items = items.into_iter().map(FeedItem::dedup_categories).collect();
        self
    }
}

/// Append ` - <label>` suffixes for every narrowing filter that is active.
pub fn title_with_suffixes(base: &str, suffixes: &[Option<&str>]) -> String {
    let mut out = base.to_string();
    for s in suffixes.iter().flatten() {
        out.push_str(" - ");
        out.push_str(s);
    }
    out
}

pub fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let cats = vec![
            "重要".to_string(),
            "A股".to_string(),
            "重要".to_string(),
            "港股".to_string(),
            "A股".to_string(),
        ];
        assert_eq!(dedup_preserving_order(cats), vec!["重要", "A股", "港股"]);
    }

    #[test]
    fn dedup_drops_empty_entries() {
        let cats = vec![String::new(), "商品".to_string(), String::new()];
        assert_eq!(dedup_preserving_order(cats), vec!["商品"]);
    }

    #[test]
    fn envelope_dedups_item_categories() {
        let mut item = FeedItem::new("t", "https://example.test");
        item.categories = vec!["x".into(), "x".into(), "y".into()];
        let env = FeedEnvelope::new("feed", "https://example.test").with_items(vec![item]);
        assert_eq!(env.items[0].categories, vec!["x", "y"]);
    }

    #[test]
    fn title_suffixes_skip_inactive_filters() {
        let t = title_with_suffixes("金十数据", &[None, Some("重要快讯"), None, Some("A股")]);
        assert_eq!(t, "金十数据 - 重要快讯 - A股");
    }

    #[test]
    fn epoch_secs_lands_in_utc8() {
        let dt = from_epoch_secs(1_700_000_000);
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }

    #[test]
    fn local_str_parses_provider_wall_time() {
        let dt = from_local_str("2024-03-01 09:30:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "09:30");
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
    }
}
