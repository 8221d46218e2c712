//! Syntax-only address validation. Pure, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;

// Local part from the printable ASCII atom set, then one or more
// dot-separated DNS labels of 1-63 alphanumeric-with-internal-hyphen
// characters. Anchored, so no whitespace or second `@` slips through.
static FORMAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^[A-Za-z0-9.!\#$%&'*+/=?^_`{|}~-]+
        @
        [A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?
        (?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+
        $",
    )
    .expect("email format pattern failed to compile. This is a bug.")
});

/// Checks whether `address` matches the accepted syntax grammar.
///
/// Deliberately a plausibility filter, not full RFC 5322: a bare domain
/// without a dot is rejected because such addresses are never routable
/// over the public internet.
pub fn is_valid_format(address: &str) -> bool {
    FORMAT_PATTERN.is_match(address)
}
