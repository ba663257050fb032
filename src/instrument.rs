// src/instrument.rs
// Financial-instrument mentions attached to flash items: sector-vs-stock
// classification by code prefix, and the percent-change display convention.
//
// Colors follow the regional convention: red = up, green = down. Do not
// flip them to the Western scheme.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Sector,
    Stock,
}

/// Prefix/substring heuristics across providers: `801` anywhere (cls sector
/// indices), a leading `8` digit (kaipanla sector codes), or the `cs`/`pt`/
/// `bk` sector prefixes (tencent). Everything else is a tradable stock.
pub fn classify(code: &str) -> InstrumentKind {
    let lower = code.to_ascii_lowercase();
    if lower.contains("801")
        || lower.starts_with('8')
        || lower.starts_with("cs")
        || lower.starts_with("pt")
        || lower.starts_with("bk")
    {
        InstrumentKind::Sector
    } else {
        InstrumentKind::Stock
    }
}

/// Eastmoney codes carry a `market.code` form; markets 0 and 90 are
/// indices/sectors, the rest are stock markets.
pub fn classify_eastmoney(market_dot_code: &str) -> InstrumentKind {
    match market_dot_code.split('.').next() {
        Some("0") | Some("90") => InstrumentKind::Sector,
        _ => InstrumentKind::Stock,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "-",
        }
    }

    /// Red for gains, green for losses (regional convention).
    pub fn color(self) -> &'static str {
        match self {
            Trend::Up => "#f5222d",
            Trend::Down => "#52c41a",
            Trend::Flat => "#666",
        }
    }

    pub fn sign(self) -> &'static str {
        match self {
            Trend::Up => "+",
            _ => "",
        }
    }
}

/// An instrument mention on a raw item, used for description and category
/// enrichment only; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentRef {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_percent: Option<f64>,
    pub kind: InstrumentKind,
}

impl InstrumentRef {
    pub fn new(code: impl Into<String>, name: impl Into<String>, change: Option<f64>) -> Self {
        let code = code.into();
        let kind = classify(&code);
        Self {
            code,
            name: name.into(),
            change_percent: change,
            kind,
        }
    }

    pub fn trend(&self) -> Trend {
        Trend::from_change(self.change_percent.unwrap_or(0.0))
    }
}

/// Split mentions into (sectors, stocks), keeping relative order.
pub fn partition(refs: Vec<InstrumentRef>) -> (Vec<InstrumentRef>, Vec<InstrumentRef>) {
    refs.into_iter()
        .partition(|r| r.kind == InstrumentKind::Sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_code_rules() {
        assert_eq!(classify("SH801780"), InstrumentKind::Sector); // 801 anywhere
        assert_eq!(classify("880330"), InstrumentKind::Sector); // leading 8
        assert_eq!(classify("cs931071"), InstrumentKind::Sector);
        assert_eq!(classify("pt02GN2162"), InstrumentKind::Sector);
        assert_eq!(classify("bk0481"), InstrumentKind::Sector);
    }

    #[test]
    fn stock_code_rules() {
        assert_eq!(classify("sh600519"), InstrumentKind::Stock);
        assert_eq!(classify("hk09988"), InstrumentKind::Stock);
        assert_eq!(classify("usNVDA"), InstrumentKind::Stock);
    }

    #[test]
    fn eastmoney_market_prefixes() {
        assert_eq!(classify_eastmoney("0.399001"), InstrumentKind::Sector);
        assert_eq!(classify_eastmoney("90.BK0481"), InstrumentKind::Sector);
        assert_eq!(classify_eastmoney("1.600519"), InstrumentKind::Stock);
        assert_eq!(classify_eastmoney("105.AAPL"), InstrumentKind::Stock);
    }

    #[test]
    fn partition_yields_one_of_each() {
        let refs = vec![
            InstrumentRef::new("SH801780", "银行", Some(1.2)),
            InstrumentRef::new("sh600519", "贵州茅台", Some(-0.8)),
        ];
        let (sectors, stocks) = partition(refs);
        assert_eq!(sectors.len(), 1);
        assert_eq!(stocks.len(), 1);
        assert_eq!(sectors[0].name, "银行");
        assert_eq!(stocks[0].name, "贵州茅台");
    }

    #[test]
    fn trend_display_keeps_red_up_convention() {
        assert_eq!(Trend::from_change(2.5).arrow(), "↑");
        assert_eq!(Trend::from_change(2.5).color(), "#f5222d");
        assert_eq!(Trend::from_change(-1.0).arrow(), "↓");
        assert_eq!(Trend::from_change(-1.0).color(), "#52c41a");
        assert_eq!(Trend::from_change(0.0).arrow(), "-");
        assert_eq!(Trend::from_change(0.0).color(), "#666");
    }
}
