// src/noise.rs
// Promotional/noise classification for flash items.
//
// The heuristics live in an ordered rule table so each rule can be tested
// on its own; the first matching rule decides. Pure and total: missing
// fields read as absent, never as errors.

/// Provider-agnostic view of the fields the rules look at.
#[derive(Debug, Clone, Default)]
pub struct FlashSignals<'a> {
    /// Explicit promotional type code on the raw item (jin10 `type == 1`).
    pub promo_type: bool,
    /// VIP paywall: `lock == true` or `vip_level > 0`.
    pub vip_locked: bool,
    /// Raw content string, HTML included.
    pub content: &'a str,
}

pub struct NoiseRule {
    pub name: &'static str,
    pub matches: fn(&FlashSignals<'_>) -> bool,
}

/// Ordered battery of heuristics, evaluated top to bottom.
pub static NOISE_RULES: &[NoiseRule] = &[
    NoiseRule {
        name: "promo-type",
        matches: |s| s.promo_type,
    },
    NoiseRule {
        name: "vip-locked",
        matches: |s| s.vip_locked,
    },
    NoiseRule {
        name: "click-bait",
        matches: |s| s.content.contains("点击查看"),
    },
    NoiseRule {
        name: "link-tail",
        matches: |s| s.content.contains(">>") || s.content.ends_with('》'),
    },
    // Short ellipsis-truncated previews without a bracketed title are VIP
    // content teasers. Length threshold as observed upstream: 200 chars.
    NoiseRule {
        name: "vip-preview",
        matches: |s| {
            s.content.contains("……")
                && s.content.chars().count() < 200
                && !s.content.contains('【')
        },
    },
    NoiseRule {
        name: "promo-phrase",
        matches: |s| {
            s.content.contains("——今日")
                || s.content.contains("——本周")
                || s.content.contains("——本月")
        },
    },
    NoiseRule {
        name: "listicle",
        matches: |s| {
            (s.content.contains("个重点") || s.content.contains("个要点"))
                && (s.content.contains("需要关注") || s.content.contains("需要留意"))
        },
    },
];

/// Name of the first rule that fires, if any.
pub fn noise_reason(signals: &FlashSignals<'_>) -> Option<&'static str> {
    NOISE_RULES
        .iter()
        .find(|r| (r.matches)(signals))
        .map(|r| r.name)
}

pub fn is_noise(signals: &FlashSignals<'_>) -> bool {
    noise_reason(signals).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(c: &str) -> FlashSignals<'_> {
        FlashSignals {
            content: c,
            ..Default::default()
        }
    }

    #[test]
    fn promo_type_rule_fires() {
        let s = FlashSignals {
            promo_type: true,
            ..Default::default()
        };
        assert_eq!(noise_reason(&s), Some("promo-type"));
    }

    #[test]
    fn vip_locked_rule_fires() {
        let s = FlashSignals {
            vip_locked: true,
            ..Default::default()
        };
        assert_eq!(noise_reason(&s), Some("vip-locked"));
    }

    #[test]
    fn click_bait_rule_fires() {
        assert_eq!(
            noise_reason(&content("最新解读，点击查看详情")),
            Some("click-bait")
        );
    }

    #[test]
    fn link_tail_rule_fires_on_arrows_and_trailing_quote() {
        assert_eq!(noise_reason(&content("详情请戳>>")), Some("link-tail"));
        assert_eq!(noise_reason(&content("《本周策略》")), Some("link-tail"));
    }

    #[test]
    fn vip_preview_rule_needs_all_three_conditions() {
        assert_eq!(noise_reason(&content("市场要变了……")), Some("vip-preview"));
        // A bracketed title marks genuine content even when truncated.
        assert_eq!(noise_reason(&content("【要闻】市场要变了……")), None);
        // Long articles with an ellipsis are not previews.
        let long = format!("{}……", "深".repeat(220));
        assert_eq!(noise_reason(&content(&long)), None);
    }

    #[test]
    fn promo_phrase_rule_fires() {
        assert_eq!(
            noise_reason(&content("黄金走势前瞻——本周重磅")),
            Some("promo-phrase")
        );
    }

    #[test]
    fn listicle_rule_needs_both_halves() {
        assert_eq!(
            noise_reason(&content("今天有3个重点需要关注")),
            Some("listicle")
        );
        assert_eq!(noise_reason(&content("今天有3个重点")), None);
        assert_eq!(noise_reason(&content("需要关注的数据很多")), None);
    }

    #[test]
    fn genuine_flash_passes_every_rule() {
        let s = content("【美联储纪要】多位官员支持维持利率不变，关注通胀走势。");
        assert!(!is_noise(&s));
    }

    #[test]
    fn first_matching_rule_wins() {
        let s = FlashSignals {
            promo_type: true,
            vip_locked: true,
            content: "点击查看",
        };
        assert_eq!(noise_reason(&s), Some("promo-type"));
    }
}
