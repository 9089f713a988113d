use std::fmt::Write;

/// Inline helper evaluated in the page: creates a `<style>` element, fills it
/// with the decoded argument and appends it to `<head>`.
pub const CSS_INJECT_FUNCTION: &str =
    "(function(e){var t=document.createElement('style'),d=document.head||document.\
     getElementsByTagName('head')[0];t.setAttribute('type','text/css'),t.styleSheet?\
     t.styleSheet.cssText=e:t.appendChild(document.createTextNode(e)),d.appendChild(t)})";

// Bytes that stay verbatim: printable ASCII minus the characters that could
// terminate the literal or open markup inside the generated script.
fn is_safe(b: u8) -> bool {
    (0x20..0x80).contains(&b) && !matches!(b, b'<' | b'>' | b'\\' | b'\'' | b'"')
}

/// Escape arbitrary bytes into a JavaScript string literal body that is safe
/// to embed between double quotes. Safe bytes are copied verbatim, everything
/// else becomes `\xHH` with lowercase hex digits.
pub fn escape_js(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input {
        if is_safe(b) {
            out.push(b as char);
        } else {
            // String as a Write sink never fails
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
    out
}

/// Number of bytes [`escape_js`] produces for `input`. Safe bytes cost one
/// byte, escaped bytes four.
pub fn escaped_len(input: &[u8]) -> usize {
    input
        .iter()
        .map(|&b| if is_safe(b) { 1 } else { 4 })
        .sum()
}

/// Wrap CSS text into a complete, self-contained injection script:
/// `CSS_INJECT_FUNCTION("escaped-css")`.
pub fn css_inject_script(css: &[u8]) -> String {
    format!("{}(\"{}\")", CSS_INJECT_FUNCTION, escape_js(css))
}
