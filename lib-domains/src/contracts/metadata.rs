//! Token metadata collaborator
//!
//! TLD registries hand every `token_uri` request to the provider deployed at
//! their metadata address. [`PlainMetadata`] is the default provider: a
//! base64 JSON descriptor with a placeholder SVG image.

use base64::{engine::general_purpose, Engine as _};
use serde_json::json;
use std::fmt::Debug;

use crate::types::TokenId;

pub const JSON_DATA_URI_PREFIX: &str = "data:application/json;base64,";
pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

pub trait MetadataProvider: Send + Sync + Debug {
    /// Token URI for `domain_name` under `tld` (the suffix, dot included)
    fn get_metadata(&self, domain_name: &str, tld: &str, token_id: TokenId) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct PlainMetadata {
    description: String,
}

impl PlainMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    fn render_image(full_name: &str) -> String {
        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="500" height="500">"#,
                r##"<rect x="0" y="0" width="500" height="500" fill="#1c1c1c"/>"##,
                r#"<text x="50%" y="50%" dominant-baseline="middle" fill="white" text-anchor="middle" font-size="32">{}</text>"#,
                "</svg>"
            ),
            escape_xml(full_name)
        );
        format!("{}{}", SVG_DATA_URI_PREFIX, general_purpose::STANDARD.encode(svg))
    }
}

impl MetadataProvider for PlainMetadata {
    fn get_metadata(&self, domain_name: &str, tld: &str, token_id: TokenId) -> String {
        let full_name = format!("{}{}", domain_name, tld);
        let descriptor = json!({
            "name": full_name,
            "description": self.description,
            "image": Self::render_image(&full_name),
            "attributes": [{ "trait_type": "token_id", "value": token_id }],
        });

        format!(
            "{}{}",
            JSON_DATA_URI_PREFIX,
            general_purpose::STANDARD.encode(descriptor.to_string())
        )
    }
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_json(uri: &str) -> serde_json::Value {
        let payload = uri.strip_prefix(JSON_DATA_URI_PREFIX).unwrap();
        let bytes = general_purpose::STANDARD.decode(payload).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_descriptor_fields() {
        let uri = PlainMetadata::new().get_metadata("alice", ".web3", 7);
        let json = decode_json(&uri);

        assert_eq!(json["name"], "alice.web3");
        assert_eq!(json["description"], "");
        assert!(json["image"].as_str().unwrap().starts_with(SVG_DATA_URI_PREFIX));
        assert_eq!(json["attributes"][0]["value"], 7);
    }

    #[test]
    fn test_image_escapes_markup() {
        let uri = PlainMetadata::with_description("punk").get_metadata("<b>", ".x", 1);
        let json = decode_json(&uri);
        let image = json["image"].as_str().unwrap();
        let svg = general_purpose::STANDARD
            .decode(image.strip_prefix(SVG_DATA_URI_PREFIX).unwrap())
            .unwrap();
        let svg = String::from_utf8(svg).unwrap();

        assert!(svg.contains("&lt;b&gt;.x"));
        assert_eq!(json["description"], "punk");
    }
}
