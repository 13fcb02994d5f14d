//! String primitives shared by the declaration grammar.

/// Trims spaces from both ends.
pub fn trim(s: &str) -> &str {
    trim_chars(s, " ")
}

/// Trims every character contained in `charset` from both ends of `s`.
pub fn trim_chars<'a>(s: &'a str, charset: &str) -> &'a str {
    s.trim_matches(|c: char| charset.contains(c))
}

/// Splits `s` on literal occurrences of `sep`.
///
/// An empty separator yields one element per code point, and a separator
/// equal to the whole subject leaves it unsplit.
pub fn split<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
    if sep.is_empty() {
        return s
            .char_indices()
            .map(|(i, c)| &s[i..i + c.len_utf8()])
            .collect();
    }
    if sep == s {
        return vec![s];
    }
    s.split(sep).collect()
}

/// Splits on single spaces and drops the empty pieces left by runs of spaces.
pub fn tokens(s: &str) -> Vec<&str> {
    split(trim(s), " ")
        .into_iter()
        .filter(|token| !token.is_empty())
        .collect()
}
