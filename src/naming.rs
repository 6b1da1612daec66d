//! Folder-name normalization
//!
//! Turns free-form place names (often non-ASCII, often carrying postal codes)
//! into names that are safe to use as directories:
//! - `sanitize_folder_name` keeps the text readable and strips illegal characters
//! - `to_single_word` builds a compact ASCII token such as `YehliuGeopark`
//! - `to_lenient_word` is a looser variant used only when the strict one gives up

use crate::geo::{Coordinate, format_rounded};
use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

/// Name used whenever nothing usable is left after normalization
pub const UNKNOWN: &str = "Unknown";

/// Decimal places of the human-readable coordinate fallback
const COORD_TEXT_PRECISION: u32 = 3;

/// Decimal places of the single-word coordinate fallback
const COORD_WORD_PRECISION: u32 = 2;

/// Numeric tokens shorter than this are treated as postal-code noise
const MIN_NUMBER_TOKEN_LEN: usize = 3;

/// Upper bound on tokens kept by the lenient normalizer
const MAX_LENIENT_TOKENS: usize = 4;

static ILLEGAL_CHARS: OnceLock<Regex> = OnceLock::new();
static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static NON_WORD: OnceLock<Regex> = OnceLock::new();
static COORDINATE_WORD: OnceLock<Regex> = OnceLock::new();
static POSTAL_CODE: OnceLock<Regex> = OnceLock::new();

fn illegal_chars() -> &'static Regex {
    ILLEGAL_CHARS.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap())
}

fn whitespace() -> &'static Regex {
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn non_word() -> &'static Regex {
    NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap())
}

fn coordinate_word() -> &'static Regex {
    COORDINATE_WORD.get_or_init(|| Regex::new(r"^Lat.*Lon").unwrap())
}

fn postal_code() -> &'static Regex {
    POSTAL_CODE.get_or_init(|| Regex::new(r"^\d{3,6}$").unwrap())
}

/// Make a string safe to use as a folder name on Windows and common filesystems
///
/// Characters `\ / : * ? " < > |` become spaces, whitespace runs collapse to
/// one space and the result is trimmed. An empty result, or one made only of
/// dots (`.`, `..`), becomes `Unknown` so it can't point outside the output.
pub fn sanitize_folder_name(name: &str) -> String {
    let replaced = illegal_chars().replace_all(name, " ");
    let collapsed = whitespace().replace_all(&replaced, " ");
    let trimmed = collapsed.trim();
    if trimmed.chars().all(|c| c == '.' || c == ' ') {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Transliterate to ASCII, turn punctuation into spaces and split into tokens
fn ascii_tokens(name: &str) -> Vec<String> {
    let ascii = deunicode(name);
    let cleaned = non_word().replace_all(&ascii, " ");
    cleaned.split_whitespace().map(str::to_string).collect()
}

fn is_alpha(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn is_short_number(token: &str) -> bool {
    is_number(token) && token.len() < MIN_NUMBER_TOKEN_LEN
}

/// Uppercase the first letter and lowercase the rest
fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Uppercase the first letter, leave the rest untouched
fn capitalize_first(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert a place name into one ASCII word
///
/// Examples: `"Taipei 101"` → `Taipei101`, `"Jiufen, New Taipei"` →
/// `JiufenNewTaipei`, `"São Paulo"` → `SaoPaulo`.
///
/// Only purely alphabetic tokens and numbers of at least three digits survive.
/// Returns `Unknown` when nothing survives or when more than half of the
/// result is digits, which is how postal codes usually look.
///
/// Keeping three-digit numbers is what lets `Taipei101` through, at the cost
/// of also keeping three-digit postal codes embedded in longer names:
/// `"Some Road, Xinyi District, 110, Taiwan"` becomes
/// `SomeRoadXinyiDistrict110Taiwan`. Names that are mostly digits are still
/// rejected by the digit-share check.
pub fn to_single_word(name: &str) -> String {
    let parts: Vec<String> = ascii_tokens(name)
        .into_iter()
        .filter(|t| is_alpha(t) || (is_number(t) && !is_short_number(t)))
        .collect();
    if parts.is_empty() {
        return UNKNOWN.to_string();
    }

    let word: String = parts
        .iter()
        .map(|t| if is_alpha(t) { capitalize(t) } else { t.clone() })
        .collect();

    let digits = word.chars().filter(|c| c.is_ascii_digit()).count();
    if digits * 2 > word.len() {
        return UNKNOWN.to_string();
    }
    word
}

/// Looser single-word conversion for names `to_single_word` rejects
///
/// Keeps up to four tokens of any shape except short numbers and only
/// uppercases their first letter.
pub fn to_lenient_word(name: &str) -> String {
    let word: String = ascii_tokens(name)
        .into_iter()
        .filter(|t| !is_short_number(t))
        .take(MAX_LENIENT_TOKENS)
        .map(|t| capitalize_first(&t))
        .collect();
    if word.is_empty() {
        UNKNOWN.to_string()
    } else {
        word
    }
}

/// Folder name built only from coordinates
///
/// Readable form: `25.034, 121.565`. Single-word form: `Lat25_03Lon121_56`
/// (dots and minus signs become underscores).
pub fn coordinate_folder_name(coord: Coordinate, single_word: bool) -> String {
    if single_word {
        format!(
            "Lat{}Lon{}",
            format_rounded(coord.latitude, COORD_WORD_PRECISION),
            format_rounded(coord.longitude, COORD_WORD_PRECISION)
        )
        .replace(['.', '-'], "_")
    } else {
        format!(
            "{}, {}",
            format_rounded(coord.latitude, COORD_TEXT_PRECISION),
            format_rounded(coord.longitude, COORD_TEXT_PRECISION)
        )
    }
}

/// True for text produced by the single-word coordinate fallback
pub fn looks_like_coordinate_name(text: &str) -> bool {
    coordinate_word().is_match(text.trim())
}

/// True for a bare 3 to 6 digit number
pub fn looks_like_postal_code(text: &str) -> bool {
    postal_code().is_match(text.trim())
}

/// True for a bare number of at most five digits
pub fn is_short_numeric(text: &str) -> bool {
    let text = text.trim();
    is_number(text) && text.len() <= 5
}

/// True if the text contains CJK ideographs
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_folder_name() {
        assert_eq!(sanitize_folder_name("Taipei 101"), "Taipei 101");
        assert_eq!(sanitize_folder_name("a/b\\c"), "a b c");
        assert_eq!(sanitize_folder_name("a:b*c?d\"e"), "a b c d e");
        assert_eq!(sanitize_folder_name("<x>|y"), "x y");
        assert_eq!(sanitize_folder_name("  spaces  "), "spaces");
        assert_eq!(sanitize_folder_name(""), "Unknown");
        assert_eq!(sanitize_folder_name(" :: "), "Unknown");
    }

    #[test]
    fn test_sanitize_rejects_dot_names() {
        assert_eq!(sanitize_folder_name(".."), "Unknown");
        assert_eq!(sanitize_folder_name(" . "), "Unknown");
        assert_eq!(sanitize_folder_name("..."), "Unknown");
        assert_eq!(sanitize_folder_name("../.."), "Unknown");
        assert_eq!(sanitize_folder_name("St. Ives"), "St. Ives");
        assert_eq!(sanitize_folder_name("..hidden"), "..hidden");
    }

    #[test]
    fn test_to_single_word() {
        assert_eq!(to_single_word("Taipei 101"), "Taipei101");
        assert_eq!(to_single_word("Yehliu Geopark"), "YehliuGeopark");
        assert_eq!(to_single_word("Jiufen, New Taipei"), "JiufenNewTaipei");
        assert_eq!(to_single_word("Shifen Old Street"), "ShifenOldStreet");
        assert_eq!(to_single_word("SHIFEN old street"), "ShifenOldStreet");
    }

    #[test]
    fn test_to_single_word_transliterates() {
        assert_eq!(to_single_word("São Paulo"), "SaoPaulo");
        assert_eq!(to_single_word("Zürich"), "Zurich");
        assert!(to_single_word("九份").is_ascii());
        assert_ne!(to_single_word("九份"), "Unknown");
    }

    #[test]
    fn test_to_single_word_rejects_postal_noise() {
        assert_eq!(to_single_word(""), "Unknown");
        assert_eq!(to_single_word("   "), "Unknown");
        assert_eq!(to_single_word("10491"), "Unknown");
        assert_eq!(to_single_word("12"), "Unknown");
        assert_eq!(to_single_word("Xinyi 11"), "Xinyi");
        // digits outweigh letters
        assert_eq!(to_single_word("A 10491"), "Unknown");
    }

    #[test]
    fn test_to_single_word_drops_mixed_tokens() {
        assert_eq!(to_single_word("3rd Avenue"), "Avenue");
        assert_eq!(to_single_word("foo_bar"), "Unknown");
    }

    #[test]
    fn test_to_lenient_word() {
        assert_eq!(to_lenient_word("foo_bar"), "Foo_bar");
        assert_eq!(to_lenient_word("3rd Avenue"), "3rdAvenue");
        assert_eq!(to_lenient_word("one two three four five"), "OneTwoThreeFour");
        assert_eq!(to_lenient_word("12 34"), "Unknown");
        assert_eq!(to_lenient_word(""), "Unknown");
    }

    #[test]
    fn test_coordinate_folder_name() {
        let coord = Coordinate::new(25.0339, 121.5641);
        assert_eq!(coordinate_folder_name(coord, false), "25.034, 121.564");
        assert_eq!(
            coordinate_folder_name(Coordinate::new(0.0, 0.0), false),
            "0.0, 0.0"
        );
        assert_eq!(
            coordinate_folder_name(Coordinate::new(25.03, 121.56), true),
            "Lat25_03Lon121_56"
        );
        assert_eq!(
            coordinate_folder_name(Coordinate::new(-33.87, 151.21), true),
            "Lat_33_87Lon151_21"
        );
    }

    #[test]
    fn test_cached_value_checks() {
        assert!(looks_like_coordinate_name("Lat25_03Lon121_56"));
        assert!(!looks_like_coordinate_name("Latvia"));
        assert!(looks_like_postal_code("104"));
        assert!(looks_like_postal_code(" 104910 "));
        assert!(!looks_like_postal_code("12"));
        assert!(!looks_like_postal_code("Taipei 101"));
        assert!(is_short_numeric("10491"));
        assert!(!is_short_numeric("104910"));
        assert!(!is_short_numeric("Da'an"));
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("九份"));
        assert!(contains_cjk("Jiufen 九份"));
        assert!(!contains_cjk("Jiufen"));
        assert!(!contains_cjk("São Paulo"));
    }
}
