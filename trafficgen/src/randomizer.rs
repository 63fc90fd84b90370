//! Field-aware randomization of example payloads.
//!
//! The rules are keyed on the telemetry field names the event-ingestion endpoints accept.
//! Only top-level keys of an object template are inspected; anything else passes through.

use fake::Fake;
use fake::faker::internet::en::Username;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_distr::{Distribution, Normal};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Seconds either side of "now" a randomized `timestamp` may land.
pub const TIMESTAMP_JITTER_SECS: i64 = 60;

pub const PAGES: &[&str] = &["/home", "/products", "/dashboard", "/pricing", "/signup"];
pub const ELEMENT_IDS: &[&str] = &["btn-signup", "cta-subscribe-button", "product-1"];
/// `None` is serialized as JSON `null`, meaning "no referrer".
pub const REFERRERS: &[Option<&str>] = &[
    None,
    Some("https://google.com"),
    Some("https://bing.com"),
    Some("/home"),
];
pub const SEVERITIES: &[&str] = &["warning", "error", "critical"];

/// `(field, mean, std_dev)` for the web-vitals timings, in milliseconds.
pub const TIMINGS: &[(&str, f64, f64)] = &[
    ("ttfb_ms", 120.0, 30.0),
    ("fcp_ms", 400.0, 100.0),
    ("lcp_ms", 900.0, 200.0),
];

/// Randomize with the thread-local RNG.
pub fn randomize(template: &Value) -> Value {
    randomize_with(template, &mut rand::rng())
}

/// Returns a fresh copy of `template` with known fields overwritten.
/// Keys are never added or removed and the template itself is left untouched.
pub fn randomize_with<R: Rng + ?Sized>(template: &Value, rng: &mut R) -> Value {
    let Value::Object(fields) = template else {
        return template.clone();
    };

    let mut out = fields.clone();

    set_scalar(&mut out, "user_id", || Value::String(user_id(rng)));
    set_scalar(&mut out, "session_id", || Value::String(session_id(rng)));
    set_scalar(&mut out, "timestamp", || json!(timestamp(rng)));
    set_scalar(&mut out, "page", || json!(pick(PAGES, rng)));
    set_scalar(&mut out, "element_id", || json!(pick(ELEMENT_IDS, rng)));
    set_scalar(&mut out, "referrer", || json!(pick(REFERRERS, rng)));
    set_scalar(&mut out, "severity", || json!(pick(SEVERITIES, rng)));

    for &(field, mean, std_dev) in TIMINGS {
        set_scalar(&mut out, field, || json!(timing(mean, std_dev, rng)));
    }

    if let Some(Value::Object(properties)) = out.get_mut("properties") {
        properties.insert("request_id".to_string(), json!(random_uuid(rng).simple().to_string()));
    }

    Value::Object(out)
}

/// Overwrite `key` only when present and not a container.
fn set_scalar(fields: &mut Map<String, Value>, key: &str, value: impl FnOnce() -> Value) {
    if let Some(slot) = fields
        .get_mut(key)
        .filter(|slot| !slot.is_object() && !slot.is_array())
    {
        *slot = value();
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(choices: &[T], rng: &mut R) -> T {
    // Choice tables are non-empty constants
    *choices.choose(rng).unwrap_or(&choices[0])
}

fn user_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    if rng.random_bool(0.5) {
        format!("user_{}", rng.random_range(1..=9999))
    } else {
        Username().fake_with_rng(rng)
    }
}

fn session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let hex = random_uuid(rng).simple().to_string();
    format!("sess-{}", &hex[..8])
}

fn timestamp<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    chrono::Utc::now().timestamp() + rng.random_range(-TIMESTAMP_JITTER_SECS..=TIMESTAMP_JITTER_SECS)
}

fn timing<R: Rng + ?Sized>(mean: f64, std_dev: f64, rng: &mut R) -> u64 {
    let sample = match Normal::new(mean, std_dev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    };
    sample.max(0.0).round() as u64
}

fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    uuid::Builder::from_random_bytes(rng.random()).into_uuid()
}
