//! Input masks for regulated identity and financial fields.
//!
//! These are keystroke formatters plus a length check for blur time. No
//! checksum validation happens here.

/// Digits in a passport series and number.
pub const PASSPORT_SERIES_NUMBER_DIGITS: usize = 10;
/// Digits in a passport issuing department code.
pub const PASSPORT_DEPARTMENT_CODE_DIGITS: usize = 6;
/// INN length for legal entities.
pub const INN_LEGAL_ENTITY_LEN: usize = 10;
/// INN length for individuals.
pub const INN_INDIVIDUAL_LEN: usize = 12;
/// Per-part limit for last, first and middle names.
pub const FULLNAME_MAX_CHARS: usize = 50;
/// Limit for the passport "issued by" and "place of birth" inputs.
pub const PASSPORT_TEXT_MAX_CHARS: usize = 120;

/// Transform applied to one masked input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    /// `XXXX XXXXXX`
    PassportSeriesNumber,
    /// `XXX-XXX`
    PassportDepartmentCode,
    Inn { legal_entity: bool },
    /// Plain character cap.
    MaxChars(usize),
}

impl Mask {
    /// Formats raw keystroke input.
    pub fn format(&self, raw: &str) -> String {
        match self {
            Mask::PassportSeriesNumber => format_passport_series_number(raw),
            Mask::PassportDepartmentCode => format_department_code(raw),
            Mask::Inn { legal_entity } => format_inn(raw, *legal_entity),
            Mask::MaxChars(max) => cap_chars(raw, *max),
        }
    }

    /// Blur-time check. Empty input is always acceptable.
    pub fn validate_length(&self, raw: &str) -> bool {
        match self {
            Mask::PassportSeriesNumber => validate_length(raw, PASSPORT_SERIES_NUMBER_DIGITS),
            Mask::PassportDepartmentCode => {
                validate_length(raw, PASSPORT_DEPARTMENT_CODE_DIGITS)
            }
            Mask::Inn { legal_entity } => raw.chars().count() <= inn_max_len(*legal_entity),
            Mask::MaxChars(max) => raw.chars().count() <= *max,
        }
    }

    /// Error flag shown next to the input: content present but invalid.
    pub fn has_error(&self, raw: &str) -> bool {
        !self.validate_length(raw)
    }
}

/// Keeps only ASCII digits.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn grouped(raw: &str, max_digits: usize, split_at: usize, separator: char) -> String {
    let digits: String = digits(raw).chars().take(max_digits).collect();
    if digits.len() > split_at {
        let (head, tail) = digits.split_at(split_at);
        format!("{head}{separator}{tail}")
    } else {
        digits
    }
}

/// `"12345678901234"` becomes `"1234 567890"`.
pub fn format_passport_series_number(raw: &str) -> String {
    grouped(raw, PASSPORT_SERIES_NUMBER_DIGITS, 4, ' ')
}

/// `"123456789"` becomes `"123-456"`.
pub fn format_department_code(raw: &str) -> String {
    grouped(raw, PASSPORT_DEPARTMENT_CODE_DIGITS, 3, '-')
}

/// True when `raw` is empty or holds exactly `required_digits` digits.
pub fn validate_length(raw: &str, required_digits: usize) -> bool {
    let count = digits(raw).len();
    raw.trim().is_empty() || count == required_digits
}

pub fn inn_max_len(legal_entity: bool) -> usize {
    if legal_entity {
        INN_LEGAL_ENTITY_LEN
    } else {
        INN_INDIVIDUAL_LEN
    }
}

/// Caps INN input at its type-dependent length.
pub fn format_inn(raw: &str, legal_entity: bool) -> String {
    cap_chars(raw, inn_max_len(legal_entity))
}

pub fn cap_chars(raw: &str, max: usize) -> String {
    raw.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_number_is_capped_and_spaced() {
        assert_eq!(format_passport_series_number("12345678901234"), "1234 567890");
        assert_eq!(format_passport_series_number("1234"), "1234");
        assert_eq!(format_passport_series_number("12 34-5"), "1234 5");
        assert_eq!(format_passport_series_number("abc"), "");
    }

    #[test]
    fn department_code_is_capped_and_hyphenated() {
        assert_eq!(format_department_code("123456789"), "123-456");
        assert_eq!(format_department_code("123"), "123");
        assert_eq!(format_department_code("1234"), "123-4");
    }

    #[test]
    fn length_check_never_flags_empty_input() {
        assert!(validate_length("", PASSPORT_SERIES_NUMBER_DIGITS));
        assert!(validate_length("1234 567890", PASSPORT_SERIES_NUMBER_DIGITS));
        assert!(!validate_length("1234 56", PASSPORT_SERIES_NUMBER_DIGITS));
        assert!(Mask::PassportDepartmentCode.has_error("12-"));
        assert!(!Mask::PassportDepartmentCode.has_error(""));
    }

    #[test]
    fn inn_cap_depends_on_entity_kind() {
        assert_eq!(format_inn("1234567890123", true), "1234567890");
        assert_eq!(format_inn("1234567890123", false), "123456789012");
        assert!(Mask::Inn { legal_entity: true }.validate_length("1234567890"));
        assert!(!Mask::Inn { legal_entity: true }.validate_length("123456789012"));
    }

    #[test]
    fn cap_counts_characters_not_bytes() {
        assert_eq!(cap_chars("Иванов", 3), "Ива");
    }
}
