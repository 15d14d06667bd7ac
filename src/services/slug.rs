//! Slug and excerpt derivation for posts.

use regex::Regex;
use std::sync::OnceLock;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

/// Derive a URL slug from a post title: accents folded, punctuation
/// stripped, whitespace runs collapsed to single hyphens, lowercased.
#[must_use]
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let folded: String = title.chars().map(fold_accent).collect();

    let stripped = get_regex(&NON_ALNUM, r"[^A-Za-z0-9\s]+").replace_all(&folded, "");
    let joined = get_regex(&WHITESPACE, r"\s+").replace_all(stripped.trim(), "-");

    joined.to_lowercase()
}

/// Derive an excerpt from post content: the first 200 characters with a
/// trailing ellipsis.
#[must_use]
pub fn derive_excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(200).collect();
    excerpt.push_str("...");
    excerpt
}

/// Map common accented Latin letters onto their ASCII base so titles in
/// Spanish and similar languages keep their letters in the slug.
const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        other => other,
    }
}
