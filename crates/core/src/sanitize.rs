//! Input sanitization (§7): a fixed denylist of injection patterns.
//!
//! HTML entities are decoded first so an encoded attack (`&lt;script`)
//! is caught by the same checks as a literal one.

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::error::{Error, Result};

static DENYLIST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)<script",
        r"(?i)javascript:",
        r"(?i)on\w+\s*=",
        r"(?i)<iframe",
        r"(?i)<object",
        r"(?i)<embed",
        r"(?i)data:text/html",
        r"(?i)vbscript:",
    ])
    .expect("denylist patterns are valid regexes")
});

fn decode_html_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Reject a query containing any denylisted pattern; otherwise return
/// it unchanged.
pub fn sanitize_query(query: &str) -> Result<String> {
    let decoded = decode_html_entities(query);
    if DENYLIST.is_match(&decoded) {
        return Err(Error::Validation(
            "query contains a disallowed pattern".to_string(),
        ));
    }
    Ok(query.to_string())
}
