// src/render.rs
// HTML description fragments shared across routes. These mirror the blocks
// the upstream web clients render: a bordered card for sectors, another for
// stocks, plus image and source footers.

use crate::instrument::InstrumentRef;

/// Bullet list of instrument mentions with the arrow/color convention.
fn instrument_lines(refs: &[InstrumentRef]) -> String {
    let mut out = String::new();
    for r in refs {
        let code = r.code.to_uppercase();
        out.push_str(&format!(
            "• <strong>{}</strong> <span style=\"color: #999;\">({code})</span><br>",
            r.name
        ));
        let change = r.change_percent.unwrap_or(0.0);
        let trend = r.trend();
        out.push_str(&format!(
            "<span style=\"color: {}; font-weight: bold;\">{} {}{change}%</span><br>",
            trend.color(),
            trend.arrow(),
            trend.sign()
        ));
    }
    out
}

fn bordered_block(heading: &str, border_color: &str, inner: &str) -> String {
    format!(
        "<br><div style=\"background: #f5f5f5; border-left: 3px solid {border_color}; \
         padding: 10px 15px; margin: 15px 0 10px 0; border-radius: 4px;\">\
         <h3 style=\"font-size: 16px; font-weight: bold; margin: 0 0 10px 0; color: #333;\">{heading}</h3>\
         {inner}</div>"
    )
}

/// 相关板块 block (blue border). Empty input renders nothing.
pub fn sector_block(sectors: &[InstrumentRef]) -> String {
    if sectors.is_empty() {
        return String::new();
    }
    bordered_block("相关板块", "#1890ff", &instrument_lines(sectors))
}

/// 相关股票 block (green border). Empty input renders nothing.
pub fn stock_block(stocks: &[InstrumentRef]) -> String {
    if stocks.is_empty() {
        return String::new();
    }
    bordered_block("相关股票", "#52c41a", &instrument_lines(stocks))
}

/// Inline `<img>` tags appended after the body.
pub fn image_tags(images: &[String]) -> String {
    if images.is_empty() {
        return String::new();
    }
    let tags: String = images
        .iter()
        .map(|img| format!("<img src=\"{img}\">"))
        .collect();
    format!("<br><br>{tags}")
}

/// 来源 footer, linked when the provider gives a source URL.
pub fn source_footer(source: &str, link: Option<&str>) -> String {
    let name = match link {
        Some(url) => format!("<a href=\"{url}\" target=\"_blank\">{source}</a>"),
        None => source.to_string(),
    };
    format!(
        "<br><br><p style=\"color: #666; font-size: 0.9em;\">📰 来源: {name}</p>"
    )
}
