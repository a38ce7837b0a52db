//! URL slugs for albums.

use unicode_normalization::UnicodeNormalization;

/// Maximum length of the base slug, leaving room for a `-N` suffix.
pub const MAX_BASE_LEN: usize = 200;

/// Lowercase ASCII slug. Accented letters decompose (NFKD) to their base
/// letter; other non-ASCII characters are dropped. Word characters are kept,
/// runs of whitespace and hyphens collapse to a single `-`, and leading and
/// trailing `-`/`_` are trimmed.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;

    let ascii = value.nfkd().filter(char::is_ascii);
    for c in ascii.map(|c| c.to_ascii_lowercase()) {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(c);
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Base slug of an album, from `"{title}-{artist}"`. Never empty.
pub fn base_slug(title: &str, artist: &str) -> String {
    let slug = slugify(&format!("{title}-{artist}"));
    let slug: String = slug.chars().take(MAX_BASE_LEN).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "album".to_string()
    } else {
        slug.to_string()
    }
}

/// The `n`th candidate: `base` itself for 0, then `base-1`, `base-2`, ...
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
