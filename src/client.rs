// src/client.rs
// Thin wrapper over reqwest for the upstream provider APIs: query
// construction, provider headers, JSONP unwrapping, and the cls.cn signed
// query string.

use std::time::Duration;

use anyhow::{Context, Result};
use md5::Md5;
use sha1::{Digest, Sha1};

/// Default timeout for auxiliary enrichment calls (quote lookups). A timed
/// out enrichment is dropped, never fatal.
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { http })
    }

    /// GET returning parsed JSON. `headers` are provider-specific
    /// (x-app-id, Referer, User-Agent...).
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let text = self.get_text(url, query, headers).await?;
        serde_json::from_str(&text).with_context(|| format!("parsing json from {url}"))
    }

    /// GET returning a JSONP payload, unwrapped via `callback(...)`
    /// prefix/suffix stripping before JSON parsing.
    pub async fn get_jsonp(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        callback: &str,
    ) -> Result<serde_json::Value> {
        let text = self.get_text(url, query, headers).await?;
        let inner = unwrap_jsonp(&text, callback)?;
        serde_json::from_str(inner).with_context(|| format!("parsing jsonp from {url}"))
    }

    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<String> {
        let mut req = self.http.get(url).query(query);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        resp.error_for_status_ref()
            .with_context(|| format!("upstream status from {url}"))?;
        resp.text().await.with_context(|| format!("reading body from {url}"))
    }

    /// Same as [`get_json`] but with the short enrichment timeout; used for
    /// optional quote lookups.
    pub async fn get_json_enrichment(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value> {
        let mut req = self.http.get(url).query(query).timeout(ENRICHMENT_TIMEOUT);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;
        let text = resp.text().await.with_context(|| format!("reading body from {url}"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing json from {url}"))
    }
}

/// Strip a `callback(...)` wrapper from a JSONP body.
pub fn unwrap_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str> {
    let start = body
        .find(&format!("{callback}("))
        .with_context(|| format!("jsonp callback `{callback}` not found"))?
        + callback.len()
        + 1;
    let end = body.rfind(')').context("jsonp closing paren not found")?;
    anyhow::ensure!(start <= end, "malformed jsonp body");
    Ok(&body[start..end])
}

/// cls.cn request signature: merge the fixed web-app parameters, sort keys,
/// then `sign = md5_hex(sha1_hex(query_string))`.
pub fn cls_signed_query(extra: &[(&str, String)]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = vec![
        ("app".into(), "CailianpressWeb".into()),
        ("os".into(), "web".into()),
        ("sv".into(), "8.6.6".into()),
    ];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.clone())));
    pairs.sort();

    let qs = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let sha = hex(&Sha1::digest(qs.as_bytes()));
    let sign = hex(&Md5::digest(sha.as_bytes()));
    pairs.push(("sign".into(), sign));
    pairs
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonp_unwraps_prefix_and_suffix() {
        let body = r#"jQuery({"data":{"fastNewsList":[]}})"#;
        assert_eq!(
            unwrap_jsonp(body, "jQuery").unwrap(),
            r#"{"data":{"fastNewsList":[]}}"#
        );
    }

    #[test]
    fn jsonp_tolerates_nested_parens() {
        let body = r#"callback({"t":"a(b)c"});"#;
        // rfind takes the last paren, so trailing `;` does not break it.
        let inner = unwrap_jsonp(body, "callback").unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(inner).is_ok());
    }

    #[test]
    fn jsonp_missing_callback_is_an_error() {
        assert!(unwrap_jsonp(r#"{"plain":"json"}"#, "jQuery").is_err());
    }

    #[test]
    fn signed_query_sorts_keys_and_appends_sign() {
        let pairs = cls_signed_query(&[("category", "red".to_string()), ("rn", "20".to_string())]);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["app", "category", "os", "rn", "sv", "sign"]);
        let sign = &pairs.last().unwrap().1;
        assert_eq!(sign.len(), 32);
        assert!(sign.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signed_query_is_deterministic() {
        let a = cls_signed_query(&[("category", String::new())]);
        let b = cls_signed_query(&[("category", String::new())]);
        assert_eq!(a, b);
    }
}
