use md5::{Digest, Md5};
use serde_json::{json, Map, Value};

const MSG_SALT: &str = "MkmC9SoIw6xCkSKHhJ7b5D2r51kBiREr";

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// §4.1.4 step 1: build the `msg` object with sorted keys, JSON-serialize,
/// base64-encode -> `msg_enc`, and compute `msg.sign = md5(msg_enc + salt)`.
pub fn build_msg_enc(pid: &str, ctime: i64, cna: &str, vid: &str, mat: i32) -> (String, String) {
    let mut msg: Map<String, Value> = Map::new();
    msg.insert("pid".into(), json!(pid));
    msg.insert("ctype".into(), json!(10004));
    msg.insert("sver".into(), json!("3.1.0"));
    msg.insert("cver".into(), json!("v1.0"));
    msg.insert("ctime".into(), json!(ctime));
    msg.insert("guid".into(), json!(cna));
    msg.insert("vid".into(), json!(vid));
    msg.insert("mat".into(), json!(mat));
    msg.insert("mcount".into(), json!(1));
    msg.insert("type".into(), json!(1));

    // BTreeMap-style key ordering: serde_json's Map preserves insertion
    // order unless the `preserve_order` feature is off, in which case it's
    // already sorted; force sorted output explicitly either way.
    let mut sorted = Map::new();
    let mut keys: Vec<&String> = msg.keys().collect();
    keys.sort();
    for k in keys {
        sorted.insert(k.clone(), msg[k].clone());
    }

    let serialized = Value::Object(sorted).to_string();
    let msg_enc = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, serialized.as_bytes());
    let sign = md5_hex(&format!("{}{}", msg_enc, MSG_SALT));
    (msg_enc, sign)
}

/// §4.1.4 step 2: outer signature over the `_m_h5_tk` prefix (substring
/// before the first `_`), timestamp, appkey and data payload.
pub fn outer_signature(m_h5_tk_cookie: &str, t: i64, appkey: &str, data_payload: &str) -> String {
    let prefix = m_h5_tk_cookie.split('_').next().unwrap_or(m_h5_tk_cookie);
    md5_hex(&format!("{}&{}&{}&{}", prefix, t, appkey, data_payload))
}

/// §4.1.4 "Total segments = floor(duration_seconds/60) + 1".
pub fn segment_count(duration_seconds: i64) -> i32 {
    (duration_seconds / 60) as i32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_count_matches_formula() {
        assert_eq!(segment_count(0), 1);
        assert_eq!(segment_count(59), 1);
        assert_eq!(segment_count(60), 2);
        assert_eq!(segment_count(125), 3);
    }

    #[test]
    fn msg_enc_is_base64() {
        let (enc, sign) = build_msg_enc("pid", 1000, "cna-value", "vid-value", 1);
        assert!(!enc.is_empty());
        assert_eq!(sign.len(), 32);
    }
}
