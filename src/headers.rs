//! Header and sheet-name normalization.
//!
//! Source spreadsheets are typed by hand and often mix Latin letters into
//! Cyrillic headers (`KM` instead of `КМ`). Every header and sheet name goes
//! through these functions before it is compared with anything.

/// Latin letters that render identically to a Cyrillic letter, paired with
/// the Cyrillic letter they stand in for. Applied after uppercasing.
pub const LOOKALIKES: &[(char, char)] = &[
    ('K', 'К'),
    ('M', 'М'),
    ('A', 'А'),
    ('B', 'В'),
    ('O', 'О'),
    ('C', 'С'),
    ('P', 'Р'),
    ('E', 'Е'),
    ('T', 'Т'),
    ('X', 'Х'),
];

fn substitute(c: char) -> char {
    LOOKALIKES
        .iter()
        .find(|(latin, _)| *latin == c)
        .map(|(_, cyrillic)| *cyrillic)
        .unwrap_or(c)
}

/// Normalizes a column header: trimmed, inner whitespace collapsed to a single
/// space, uppercased, Latin look-alikes replaced by Cyrillic.
///
/// ```
/// use track_rater::headers::normalize_header;
/// assert_eq!(normalize_header("KM"), "КМ");
/// assert_eq!(normalize_header("  км   нач "), "КМ НАЧ");
/// ```
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .chars()
        .map(substitute)
        .collect()
}

/// Normalizes a sheet name for fuzzy lookup: like [`normalize_header`] but
/// with all whitespace removed, so `"Оценка КМ"` and `"оценкаKM"` compare equal.
pub fn normalize_sheet_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
        .chars()
        .map(substitute)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin_km_becomes_cyrillic() {
        let normalized = normalize_header("KM");
        assert_eq!(normalized, "КМ");
        assert_eq!(normalized, normalize_header("КМ"));
        assert!(normalized.chars().all(|c| !c.is_ascii()));
    }

    #[test]
    fn test_mixed_alphabet_header() {
        // Latin "O", "C", "E" mixed into a Cyrillic word
        assert_eq!(normalize_header("OЦEНKA"), "ОЦЕНКА");
        assert_eq!(normalize_header(" КооРДИНАТА "), "КООРДИНАТА");
    }

    #[test]
    fn test_lowercase_latin_is_uppercased_first() {
        assert_eq!(normalize_header("km"), "КМ");
    }

    #[test]
    fn test_non_lookalike_letters_untouched() {
        assert_eq!(normalize_header("Nуч"), "NУЧ");
        assert_eq!(normalize_header("id 2"), "ID 2");
    }

    #[test]
    fn test_sheet_name_ignores_all_whitespace() {
        assert_eq!(normalize_sheet_name("Оценка КМ"), "ОЦЕНКАКМ");
        assert_eq!(
            normalize_sheet_name(" оценка\tKM "),
            normalize_sheet_name("Оценка КМ")
        );
        assert_ne!(normalize_sheet_name("Оценка"), normalize_sheet_name("Оценка КМ"));
    }
}
