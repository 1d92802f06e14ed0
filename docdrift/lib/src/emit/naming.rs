//! Identifier naming for generated declarations.
//!
//! Upstream names come in every shape (`rich_text`, `file_upload`, `PageId`,
//! `2022-06-28`). They are split into words once and re-joined in the case the
//! target position needs.

/// Splits a CamelCase string into its component words.
///
/// Handles acronyms: "HTTPClient" -> ["HTTP", "Client"], "OpenAI" -> ["Open", "AI"].
fn split_camel_case(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut word_start = 0;
    let chars: Vec<(usize, char)> = s.char_indices().collect();

    for i in 1..chars.len() {
        let (offset, current) = chars[i];
        let prev = chars[i - 1].1;

        // "fileUpload" -> "file", "Upload"; "HTTPClient" -> "HTTP", "Client"
        let is_new_word = current.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (i + 1 < chars.len() && chars[i + 1].1.is_lowercase() && prev.is_uppercase()));

        if is_new_word {
            if offset > word_start {
                words.push(&s[word_start..offset]);
            }
            word_start = offset;
        }
    }

    if word_start < s.len() {
        words.push(&s[word_start..]);
    }

    words
}

/// All words of `s`, splitting on any non-alphanumeric character and on
/// case changes.
pub fn words(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(split_camel_case)
        .collect()
}

/// ```
/// use docdrift_lib::emit::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("file_upload"), "FileUpload");
/// assert_eq!(to_pascal_case("rich text"), "RichText");
/// assert_eq!(to_pascal_case("PageID"), "PageId");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    words(s)
        .into_iter()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

/// ```
/// use docdrift_lib::emit::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("FileOrEmoji"), "file_or_emoji");
/// assert_eq!(to_snake_case("created_time"), "created_time");
/// ```
pub fn to_snake_case(s: &str) -> String {
    words(s)
        .into_iter()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Whether `s` is a Rust keyword that needs the raw `r#` form.
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// Keywords that cannot be raw identifiers either.
pub fn is_reserved(s: &str) -> bool {
    matches!(s, "self" | "Self" | "super" | "crate" | "_")
}
