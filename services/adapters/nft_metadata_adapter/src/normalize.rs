//! Metadata document normalization
//!
//! Minting tools disagree on field names. This maps the common variants onto
//! one [`MetadataRecord`].

use serde_json::Value;
use types::MetadataRecord;

use crate::uri::to_http_url;

/// Build a record from a metadata JSON object; unknown shapes give blanks
pub fn normalize_metadata(doc: &Value, gateways: &[String]) -> MetadataRecord {
    if !doc.is_object() {
        return MetadataRecord::default();
    }

    let image = first_string(
        doc,
        &[
            "/image",
            "/image_url",
            "/imageUrl",
            "/artwork/uri",
            "/artwork/url",
            "/properties/image",
            "/properties/image/description",
            "/animation_url",
        ],
    )
    .map(|image| to_http_url(&image, gateways))
    .unwrap_or_default();

    let name = first_string(doc, &["/name", "/title"]).unwrap_or_default();
    let description = first_string(doc, &["/description", "/details"]).unwrap_or_default();

    let collection = match doc.get("collection") {
        Some(Value::String(name)) => name.trim().to_string(),
        Some(Value::Object(_)) => first_string(doc, &["/collection/name", "/collection/family"])
            .unwrap_or_default(),
        _ => String::new(),
    };

    MetadataRecord {
        image,
        name,
        description,
        collection,
    }
}

fn first_string(doc: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| {
        doc.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateways() -> Vec<String> {
        vec!["https://ipfs.io/ipfs/".to_string()]
    }

    #[test]
    fn test_common_fields() {
        let record = normalize_metadata(
            &json!({
                "name": "Punk #1",
                "description": "First",
                "image": "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG/1.png",
                "collection": {"name": "Punks", "family": "XRPunks"}
            }),
            &gateways(),
        );
        assert_eq!(record.name, "Punk #1");
        assert_eq!(record.description, "First");
        assert_eq!(
            record.image,
            "https://ipfs.io/ipfs/QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG/1.png"
        );
        assert_eq!(record.collection, "Punks");
    }

    #[test]
    fn test_alternate_field_names() {
        let record = normalize_metadata(
            &json!({
                "title": "Sunset",
                "details": "Painted",
                "artwork": {"uri": "https://art.test/sunset.jpg"},
                "collection": "Skies"
            }),
            &gateways(),
        );
        assert_eq!(record.name, "Sunset");
        assert_eq!(record.description, "Painted");
        assert_eq!(record.image, "https://art.test/sunset.jpg");
        assert_eq!(record.collection, "Skies");

        let nested = normalize_metadata(
            &json!({"properties": {"image": "https://art.test/p.png"}, "image": ""}),
            &gateways(),
        );
        assert_eq!(nested.image, "https://art.test/p.png");
    }

    #[test]
    fn test_non_object_is_blank() {
        assert!(normalize_metadata(&json!("just a string"), &gateways()).is_blank());
        assert!(normalize_metadata(&json!({"unrelated": 1}), &gateways()).is_blank());
    }
}
