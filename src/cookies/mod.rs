//! Cookie model and the enumerable jar.
//!
//! [`CookieRecord`] is the normalized, serializable form a cookie takes in
//! durable storage; [`RecordJar`] holds the live set for one transport and
//! converts between records and the wire headers.

mod jar;
mod record;

pub use jar::RecordJar;
pub use record::{CookieRecord, CookieSet};
