//! Timestamp-based ID generation for forms and fields.
//!
//! Ids have the shape `<prefix>_<unix-millis>`. Two ids requested within the
//! same millisecond would collide, so the generator never hands out a
//! timestamp at or below the last one it used.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Prefix for generated form ids.
pub const FORM_PREFIX: &str = "form";

/// Prefix for generated field ids.
pub const FIELD_PREFIX: &str = "field";

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Returns a strictly increasing millisecond stamp, starting from `now`.
fn next_stamp(now: DateTime<Utc>) -> i64 {
    let wanted = now.timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let candidate = wanted.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// Generates an id with the given prefix.
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", prefix, next_stamp(now))
}

/// Generates a new form id (`form_<millis>`).
pub fn new_form_id() -> String {
    generate_id(FORM_PREFIX, Utc::now())
}

/// Generates a new field id (`field_<millis>`).
pub fn new_field_id() -> String {
    generate_id(FIELD_PREFIX, Utc::now())
}
