//! URI references and gateway rewriting
//!
//! Content-addressed references (`ipfs://<cid>/<path>`, bare CIDs, or an
//! HTTP URL into some gateway's `/ipfs/` space) are reduced to their
//! content path so they can be fetched through any gateway.

/// Scheme for content-addressed references
const IPFS_SCHEME: &str = "ipfs://";

/// Path segment every public gateway serves content under
const IPFS_PATH: &str = "/ipfs/";

/// Permanent-storage references
const AR_SCHEME: &str = "ar://";
const AR_GATEWAY: &str = "https://arweave.net/";

/// Content path (`<cid>[/<path>]`) of a content-addressed reference
pub fn content_path(reference: &str) -> Option<String> {
    let reference = reference.trim();

    if let Some(rest) = reference.strip_prefix(IPFS_SCHEME) {
        let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
        return non_empty(rest);
    }

    if is_http(reference) {
        let without_query = reference.split(['?', '#']).next().unwrap_or(reference);
        return without_query
            .find(IPFS_PATH)
            .and_then(|at| non_empty(&without_query[at + IPFS_PATH.len()..]));
    }

    if looks_like_cid(reference.split('/').next().unwrap_or_default()) {
        return non_empty(reference);
    }

    None
}

/// Whether the reference is content-addressed
pub fn is_content_addressed(reference: &str) -> bool {
    content_path(reference).is_some()
}

/// HTTP URLs worth trying for `reference`, in priority order.
///
/// A URL that already points into a gateway is tried first, then the same
/// content through every configured gateway.
pub fn gateway_candidates(reference: &str, gateways: &[String]) -> Vec<String> {
    let reference = reference.trim();
    let mut candidates: Vec<String> = Vec::new();

    if let Some(path) = content_path(reference) {
        if is_http(reference) {
            candidates.push(reference.to_string());
        }
        for gateway in gateways {
            let url = join_gateway(gateway, &path);
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    } else if let Some(rest) = reference.strip_prefix(AR_SCHEME) {
        if !rest.is_empty() {
            candidates.push(format!("{}{}", AR_GATEWAY, rest));
        }
    } else if is_http(reference) {
        candidates.push(reference.to_string());
    }

    candidates
}

/// Rewrite a media link to something a browser can load
pub fn to_http_url(reference: &str, gateways: &[String]) -> String {
    let reference = reference.trim();
    if is_http(reference) || reference.starts_with("data:") {
        return reference.to_string();
    }
    gateway_candidates(reference, gateways)
        .into_iter()
        .next()
        .unwrap_or_else(|| reference.to_string())
}

fn join_gateway(gateway: &str, path: &str) -> String {
    let base = gateway.trim_end_matches('/');
    if base.ends_with("/ipfs") {
        format!("{}/{}", base, path)
    } else {
        format!("{}{}{}", base, IPFS_PATH, path)
    }
}

fn is_http(reference: &str) -> bool {
    reference.starts_with("https://") || reference.starts_with("http://")
}

/// CIDv0 (`Qm…`, 46 chars) or CIDv1 base32 (`baf…`)
fn looks_like_cid(segment: &str) -> bool {
    let alphanumeric = segment.chars().all(|c| c.is_ascii_alphanumeric());
    (segment.len() == 46 && segment.starts_with("Qm") && alphanumeric)
        || (segment.len() >= 50 && segment.starts_with("baf") && alphanumeric)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim_matches('/');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn gateways() -> Vec<String> {
        vec![
            "https://ipfs.io/ipfs/".to_string(),
            "https://gateway.pinata.cloud/ipfs".to_string(),
        ]
    }

    #[test]
    fn test_content_path_forms() {
        assert_eq!(content_path(&format!("ipfs://{}/1.json", CID)).unwrap(), format!("{}/1.json", CID));
        assert_eq!(content_path(&format!("ipfs://ipfs/{}", CID)).unwrap(), CID);
        assert_eq!(content_path(CID).unwrap(), CID);
        assert_eq!(
            content_path(&format!("https://nftstorage.link/ipfs/{}/meta.json?x=1", CID)).unwrap(),
            format!("{}/meta.json", CID)
        );
        assert_eq!(content_path("https://example.com/meta/1.json"), None);
        assert_eq!(content_path("ipfs://"), None);
    }

    #[test]
    fn test_gateway_candidates_order() {
        let original = format!("https://nftstorage.link/ipfs/{}", CID);
        let candidates = gateway_candidates(&original, &gateways());
        assert_eq!(
            candidates,
            vec![
                original.clone(),
                format!("https://ipfs.io/ipfs/{}", CID),
                format!("https://gateway.pinata.cloud/ipfs/{}", CID),
            ]
        );

        let plain = gateway_candidates("https://example.com/1.json", &gateways());
        assert_eq!(plain, vec!["https://example.com/1.json".to_string()]);

        let arweave = gateway_candidates("ar://abc123", &gateways());
        assert_eq!(arweave, vec!["https://arweave.net/abc123".to_string()]);

        assert!(gateway_candidates("not a uri", &gateways()).is_empty());
    }

    #[test]
    fn test_media_rewrite() {
        assert_eq!(
            to_http_url(&format!("ipfs://{}/img.png", CID), &gateways()),
            format!("https://ipfs.io/ipfs/{}/img.png", CID)
        );
        assert_eq!(to_http_url("https://x.test/a.png", &gateways()), "https://x.test/a.png");
        assert!(is_content_addressed(&format!("ipfs://{}", CID)));
        assert!(!is_content_addressed("https://x.test/a.png"));
    }
}
