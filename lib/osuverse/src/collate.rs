//! Locale-style string ordering for sorting beatmaps by artist.
//!
//! Approximates the default collation a user expects from a file browser:
//! whitespace, then punctuation, then digits, then letters; accents and
//! case only break ties.

use std::cmp::Ordering;

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_keys(a)
        .cmp(primary_keys(b))
        .then_with(|| secondary_keys(a).cmp(secondary_keys(b)))
        .then_with(|| tertiary_keys(a).cmp(tertiary_keys(b)))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Whitespace,
    Punctuation,
    Digit,
    Letter,
}

fn class_of(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_numeric() {
        CharClass::Digit
    } else if c.is_alphabetic() {
        CharClass::Letter
    } else {
        CharClass::Punctuation
    }
}

fn primary_keys(s: &str) -> impl Iterator<Item = (CharClass, char)> + '_ {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(strip_accent)
        .map(|c| (class_of(c), c))
}

fn secondary_keys(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Lowercase sorts before uppercase.
fn tertiary_keys(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ł' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ŕ' | 'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut names: Vec<&str>) -> Vec<&str> {
        names.sort_by(|a, b| locale_cmp(a, b));
        names
    }

    #[test]
    fn ignores_case_for_primary_order() {
        assert_eq!(sorted(vec!["beta", "Alpha", "alpha", "Charlie"]), vec![
            "alpha", "Alpha", "beta", "Charlie"
        ]);
    }

    #[test]
    fn accents_only_break_ties() {
        assert_eq!(sorted(vec!["Ez", "Éa", "Ea"]), vec!["Ea", "Éa", "Ez"]);
    }

    #[test]
    fn punctuation_and_digits_before_letters() {
        assert_eq!(sorted(vec!["zeta", "~tilde", "9mm", " space", ""]), vec![
            "", " space", "~tilde", "9mm", "zeta"
        ]);
    }

    #[test]
    fn empty_artist_sorts_first() {
        assert_eq!(locale_cmp("", "a"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }
}
