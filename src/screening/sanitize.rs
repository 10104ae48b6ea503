//! Output sanitization for model-generated text destined for markdown surfaces.

/// Escapes `*`, `_`, and `$` and normalizes non-breaking spaces.
///
/// Already-escaped characters are left alone, so applying this to its own output is a
/// no-op. Every model response passes through here before reaching a caller.
pub fn sanitize_markdown(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    // Tracks whether the previous character was a backslash acting as an escape.
    let mut escaped = false;
    for ch in input.chars() {
        match ch {
            '\u{a0}' => {
                out.push(' ');
                escaped = false;
            }
            '*' | '_' | '$' => {
                if !escaped {
                    out.push('\\');
                }
                out.push(ch);
                escaped = false;
            }
            '\\' => {
                out.push(ch);
                escaped = true;
            }
            other => {
                out.push(other);
                escaped = false;
            }
        }
    }
    out
}
