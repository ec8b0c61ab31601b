//! Well-known cache keys
//!
//! Shared names keep unrelated callers from colliding on the same key.

use sha2::{Digest, Sha256};

pub const CATEGORIES: &str = "categories";
pub const USER_CATEGORIES: &str = "user_categories";
pub const TAGS: &str = "tags";
pub const USER_PROFILE: &str = "user_profile";
pub const CODES_LIST: &str = "codes_list";
pub const USER_CODES: &str = "user_codes";
pub const ADMIN_USERS: &str = "admin_users";
pub const ADMIN_CODES: &str = "admin_codes";

/// Request keys longer than this are replaced by a digest
pub const MAX_REQUEST_KEY_LEN: usize = 200;

/// Key for a single snippet's detail view.
pub fn code_detail(id: u64) -> String {
    format!("code_detail_{}", id)
}

/// Builds a key for a parameterized request.
///
/// Produces `prefix[:k1=v1&k2=v2][:user_<id>]`, with parameters sorted by
/// name so that argument order does not change the key. A key longer than
/// [`MAX_REQUEST_KEY_LEN`] becomes `prefix:<sha256 hex>`, which still
/// matches an `invalidate` on the prefix.
pub fn request_key(prefix: &str, params: &[(&str, &str)], user_id: Option<u64>) -> String {
    let mut parts = vec![prefix.to_string()];

    if !params.is_empty() {
        let mut sorted = params.to_vec();
        sorted.sort();
        let query = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        parts.push(query);
    }

    if let Some(id) = user_id {
        parts.push(format!("user_{}", id));
    }

    let key = parts.join(":");
    if key.len() > MAX_REQUEST_KEY_LEN {
        format!("{}:{}", prefix, hex::encode(Sha256::digest(key.as_bytes())))
    } else {
        key
    }
}
