//! Cache key derivation
//!
//! Every cacheable request maps to exactly one key string. Structured list
//! queries spell out their shape (`games:list:page=1:per=20:genre=rpg`) so
//! the whole family can be dropped with a prefix delete; free-text searches
//! are digested so arbitrary user input never lands in a key.

use sha2::{Digest, Sha256};

use super::super::query::QuerySpec;

/// Segment separating the resource kind from the list namespace
pub const LIST_SEGMENT: &str = "list";
/// Segment separating the resource kind from the search namespace
pub const SEARCH_SEGMENT: &str = "search";

/// Builds the key for a list/search request.
///
/// Filter insertion order never affects the result: filters are iterated in
/// name order. Two specs with identical normalized content map to the same
/// key.
pub fn list_key(spec: &QuerySpec) -> String {
    if spec.is_search() {
        return search_key(spec);
    }

    let mut key = format!(
        "{}:{}:page={}:per={}",
        spec.resource, LIST_SEGMENT, spec.page, spec.per_page
    );

    for (name, value) in &spec.filters {
        key.push(':');
        key.push_str(name);
        key.push('=');
        key.push_str(&value.to_string());
    }

    key
}

/// Builds the key for a detail (fetch-by-id) request
pub fn detail_key(resource: &str, id: i64) -> String {
    format!("{}:{}", resource, id)
}

/// Prefix covering every list key of a resource kind
pub fn list_prefix(resource: &str) -> String {
    format!("{}:{}:", resource, LIST_SEGMENT)
}

/// Prefix covering every search key of a resource kind
pub fn search_prefix(resource: &str) -> String {
    format!("{}:{}:", resource, SEARCH_SEGMENT)
}

/// Digest-based key for free-text searches: the full raw parameter set is
/// serialized as canonical sorted-key compact JSON and hashed, bounding key
/// length regardless of what the user typed.
fn search_key(spec: &QuerySpec) -> String {
    let canonical =
        serde_json::to_string(&spec.raw_params).expect("string map serialization cannot fail");

    let digest = Sha256::digest(canonical.as_bytes());
    format!("{}:{}:{}", spec.resource, SEARCH_SEGMENT, hex::encode(digest))
}
