// Fixture-driven pipeline checks across providers: noise filtering, title
// normalization, category hygiene, and envelope serialization.

use serde_json::json;

use flashwire::routes::{jin10, kaipanla, wallstreetcn};

fn jin10_fixture() -> jin10::FlashResponse {
    serde_json::from_value(json!({
        "data": [
            { "id": "1", "data": { "content": "黄金深度报告，点击查看详情" } },
            { "id": "2", "data": { "content": "VIP快讯", "lock": true } },
            { "id": "3", "type": 1, "data": { "content": "会员限时优惠" } },
            {
                "id": "4",
                "important": 1,
                "time": "2024-03-01 09:30:00",
                "data": { "content": "【美股盘前】期指走高。" },
                "tags": ["美股", "美股"]
            }
        ]
    }))
    .unwrap()
}

#[test]
fn noise_rules_drop_promos_and_locked_items() {
    let opts = jin10::FlashOptions {
        channel: String::new(),
        limit: 50,
        important_only: false,
    };
    let env = jin10::build_feed(&jin10_fixture(), &opts);
    assert_eq!(env.items.len(), 1);
    assert_eq!(env.items[0].title, "美股盘前");
    assert_eq!(env.items[0].categories, vec!["重要", "美股"]);
}

#[test]
fn envelope_serialization_skips_empty_fields() {
    let opts = jin10::FlashOptions {
        channel: String::new(),
        limit: 50,
        important_only: false,
    };
    let env = jin10::build_feed(&jin10_fixture(), &opts);
    let value = serde_json::to_value(&env).unwrap();

    assert_eq!(value["title"], "金十数据 - 美港电讯");
    let item = &value["items"][0];
    assert!(item.get("image").is_none() || !item["image"].is_null());
    // pub_date carries the UTC+8 offset.
    assert!(item["pub_date"].as_str().unwrap().ends_with("+08:00"));
}

#[test]
fn provider_order_is_preserved_end_to_end() {
    let resp: wallstreetcn::LiveResponse = serde_json::from_value(json!({
        "data": { "items": [
            { "id": 3, "content_text": "三", "display_time": 300, "uri": "u3", "score": 1 },
            { "id": 1, "content_text": "一", "display_time": 100, "uri": "u1", "score": 1 },
            { "id": 2, "content_text": "二", "display_time": 200, "uri": "u2", "score": 1 }
        ]}
    }))
    .unwrap();
    let env = wallstreetcn::build_feed(&resp, "global", 1);
    let guids: Vec<&str> = env.items.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(
        guids,
        vec![
            "wallstreetcn-live-3",
            "wallstreetcn-live-1",
            "wallstreetcn-live-2"
        ]
    );
}

#[test]
fn review_strength_bands_render_single_item() {
    let resp: kaipanla::ReviewResponse = serde_json::from_value(json!({
        "info": { "strong": 85, "sign": "情绪高涨。" }
    }))
    .unwrap();
    let env = kaipanla::build_review_feed(&resp);
    assert_eq!(env.items.len(), 1);
    assert!(env.items[0].title.contains("极强"));
    assert!(env.items[0].guid.starts_with("kaipanla:review:"));
}
