//! HTML entity decoding for captured code

/// Decodes HTML character references in `input`
///
/// Covers the full HTML5 named-entity table, including the legacy names that may
/// omit the trailing `;` (`&nbsp`, `&copy`), plus decimal and hexadecimal
/// references. Unknown references are kept verbatim. Decoding is a single pass, so
/// `&amp;lt;` comes out as `&lt;`.
pub fn unescape(input: &str) -> String {
    htmlize::unescape(input).into_owned()
}
