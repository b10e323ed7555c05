//! Token and link fixtures.

use base64::{Engine as _, engine::general_purpose};
use phishwatch_api_models::LinkRecord;
use serde_json::{Value, json};

/// Header segment used for minted tokens; its content is never inspected.
const HEADER_SEGMENT: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";

/// Build an unsigned three-segment token whose payload is `claims`.
///
/// The signature segment is a fixed placeholder: the client never verifies it.
#[must_use]
pub fn mint_token(claims: &Value) -> String {
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{HEADER_SEGMENT}.{payload}.c2lnbmF0dXJl")
}

/// Token carrying a full display profile.
#[must_use]
pub fn profile_token(username: &str, email: &str, profile_image: &str) -> String {
    mint_token(&json!({
        "username": username,
        "email": email,
        "profileImage": profile_image,
        "exp": 4_102_444_800_u64,
    }))
}

/// Construct one link record.
#[must_use]
pub fn link(url: &str, domain: &str, is_safe: bool, is_blocked: bool) -> LinkRecord {
    LinkRecord {
        url: url.to_string(),
        domain: domain.to_string(),
        is_safe,
        is_blocked,
    }
}

/// A small mixed collection covering every safe/blocked combination.
#[must_use]
pub fn sample_links() -> Vec<LinkRecord> {
    vec![
        link("http://example.com/a", "example.com", true, false),
        link("http://example.com/b", "example.com", true, true),
        link("http://phish.example/login", "phish.example", false, true),
        link("https://bank-secure.example/verify", "bank-secure.example", false, false),
    ]
}

/// JSON body for a link listing response.
#[must_use]
pub fn links_body(links: &[LinkRecord]) -> Value {
    Value::Array(
        links
            .iter()
            .map(|record| {
                json!({
                    "url": record.url,
                    "domain": record.domain,
                    "is_safe": record.is_safe,
                    "is_blocked": record.is_blocked,
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_has_three_segments_and_decodable_payload() {
        let token = mint_token(&json!({"username": "ada"}));
        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(segments[1])
            .expect("payload decodes");
        let value: Value = serde_json::from_slice(&payload).expect("payload is json");
        assert_eq!(value["username"], "ada");
    }

    #[test]
    fn sample_links_have_unique_urls() {
        let links = sample_links();
        let mut urls: Vec<&str> = links.iter().map(|record| record.url.as_str()).collect();
        urls.sort_unstable();
        urls.dedup();
        assert_eq!(urls.len(), links.len());
    }

    #[test]
    fn links_body_round_trips_into_records() {
        let links = sample_links();
        let decoded: Vec<LinkRecord> =
            serde_json::from_value(links_body(&links)).expect("decode body");
        assert_eq!(decoded, links);
    }
}
