//! Search-text normalisation for Japanese and Latin character names.
//!
//! Both the query and the candidate text are folded to the same form before a
//! substring test, so that `ＫＩＴＴＹ`, `kitty` and `Kitty` all match, and
//! katakana and hiragana spellings of the same name match each other.

/// Katakana `ァ`..=`ヶ` → hiragana `ぁ`..=`ゖ`.
fn katakana_to_hiragana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Full-width ASCII letters, digits and common symbols → half-width.
fn full_width_to_half_width(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        '＆' => '&',
        '！' => '!',
        '？' => '?',
        '（' => '(',
        '）' => ')',
        '＋' => '+',
        '－' => '-',
        '＝' => '=',
        '％' => '%',
        _ => c,
    }
}

/// Fold `text` into its search form: lowercase, no whitespace (ideographic
/// space included), half-width ASCII, hiragana instead of katakana.
pub fn normalize_for_search(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(full_width_to_half_width)
        .flat_map(char::to_lowercase)
        .map(katakana_to_hiragana)
        .collect()
}

/// Whether `query` occurs in `text` after both are normalised.
/// An empty query or text never matches.
pub fn flexible_match(text: &str, query: &str) -> bool {
    if text.is_empty() || query.is_empty() {
        return false;
    }
    let query = normalize_for_search(query);
    !query.is_empty() && normalize_for_search(text).contains(&query)
}

/// Whether any present field matches `query`.
pub fn multi_field_match(fields: &[Option<&str>], query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    fields
        .iter()
        .flatten()
        .any(|field| flexible_match(field, query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_width_case_and_spaces() {
        assert_eq!(normalize_for_search("Ｈｅｌｌｏ　Ｋｉｔｔｙ"), "hellokitty");
        assert_eq!(normalize_for_search("My Melody ！"), "mymelody!");
    }

    #[test]
    fn folds_katakana_to_hiragana() {
        assert_eq!(normalize_for_search("キティ"), "きてぃ");
        assert!(flexible_match("ハローキティ", "はろー"));
        assert!(flexible_match("ぽむぽむぷりん", "ポムポム"));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!flexible_match("", "a"));
        assert!(!flexible_match("abc", ""));
        assert!(!flexible_match("abc", "   "));
        assert!(!multi_field_match(&[Some("abc")], ""));
    }

    #[test]
    fn multi_field_skips_missing_fields() {
        let fields = [Some("シナモロール"), None, Some("Cinnamoroll")];
        assert!(multi_field_match(&fields, "cinna"));
        assert!(multi_field_match(&fields, "しなも"));
        assert!(!multi_field_match(&fields, "kitty"));
    }
}
