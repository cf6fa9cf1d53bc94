//! Phone number normalization for search input and contact matching.
//!
//! Parsing is locale-neutral: every input is read as an international
//! number. The detected region is only used to look up a country name.

use isocountry::CountryCode;
use rlibphonenumber::{region_code::RegionCode, PhoneNumber, PhoneNumberFormat, PHONE_NUMBER_UTIL};

/// Canonical form of a typed or stored phone string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedPhone {
    /// Text to show back to the user.
    pub display_text: String,
    /// Comparison key; two phones match iff these are equal.
    pub digits_only: String,
    /// English name of the detected region, if any.
    pub country_name: Option<String>,
}

impl NormalizedPhone {
    fn unparsed(raw: &str) -> Self {
        Self {
            display_text: raw.to_string(),
            digits_only: digits_only(raw),
            country_name: None,
        }
    }
}

/// Normalize raw input into display text, digit key and country.
///
/// Text that does not parse is returned unchanged; that is the normal state
/// while a number is still being typed. Normalizing the returned
/// `display_text` again yields the same value.
pub fn normalize(raw: &str) -> NormalizedPhone {
    let mut current = normalize_once(raw);
    // Formatting can keep a leading national zero that a reparse drops.
    for _ in 0..MAX_REPARSES {
        let next = normalize_once(&current.display_text);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const MAX_REPARSES: usize = 2;

fn normalize_once(raw: &str) -> NormalizedPhone {
    if raw.is_empty() {
        return NormalizedPhone::default();
    }

    let candidate = if looks_national(raw) {
        format!("+{}", raw)
    } else {
        raw.to_string()
    };

    let Some(number) = parse_international(&candidate) else {
        return NormalizedPhone::unparsed(raw);
    };

    let display_text = format_display(&number, &candidate);
    NormalizedPhone {
        digits_only: digits_only(&display_text),
        country_name: country_name(&number),
        display_text,
    }
}

/// Strip everything but ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn phones_match(lhs: &str, rhs: &str) -> bool {
    digits_only(lhs) == digits_only(rhs)
}

// Bare digit strings are tried as international numbers.
fn looks_national(raw: &str) -> bool {
    !raw.trim_start().starts_with('+') && !raw.chars().any(char::is_alphabetic)
}

fn parse_international(input: &str) -> Option<PhoneNumber> {
    PHONE_NUMBER_UTIL.parse(input, RegionCode::get_unknown()).ok()
}

fn format_display(number: &PhoneNumber, candidate: &str) -> String {
    let international = PHONE_NUMBER_UTIL
        .format(number, PhoneNumberFormat::International)
        .into_owned();
    let prefix = format!("+{} ", number.country_code());
    let without_prefix = international
        .strip_prefix(prefix.as_str())
        .unwrap_or(&international)
        .to_string();

    if strip_spaces(candidate) != strip_spaces(&without_prefix) {
        format!("{}{}", prefix, without_prefix)
    } else {
        without_prefix
    }
}

fn strip_spaces(value: &str) -> String {
    value.chars().filter(|c| *c != ' ').collect()
}

fn country_name(number: &PhoneNumber) -> Option<String> {
    let region = PHONE_NUMBER_UTIL.get_region_code_for_number(number);
    if region.is_empty() || region.eq_ignore_ascii_case(RegionCode::get_unknown()) {
        return None;
    }
    CountryCode::for_alpha2(&region.to_ascii_uppercase())
        .ok()
        .map(|code| code.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_stays_empty() {
        assert_eq!(normalize(""), NormalizedPhone::default());
    }

    #[test]
    fn test_formats_international_number() {
        let phone = normalize("+16502530000");
        assert_eq!(phone.display_text, "+1 650-253-0000");
        assert_eq!(phone.digits_only, "16502530000");
        let country = phone.country_name.expect("US number has a region");
        assert!(country.contains("United States"), "got {}", country);
    }

    #[test]
    fn test_bare_digits_are_read_as_international() {
        let phone = normalize("442079460958");
        assert!(phone.display_text.starts_with("+44 "), "got {}", phone.display_text);
        assert_eq!(phone.digits_only, "442079460958");
        assert!(phone.country_name.is_some());
    }

    #[test]
    fn test_text_with_letters_is_left_alone() {
        let phone = normalize("carl");
        assert_eq!(phone.display_text, "carl");
        assert_eq!(phone.digits_only, "");
        assert_eq!(phone.country_name, None);
    }

    #[test]
    fn test_unparseable_digits_fall_back_to_raw_text() {
        let phone = normalize("5");
        assert_eq!(phone.display_text, "5");
        assert_eq!(phone.digits_only, "5");
        assert_eq!(phone.country_name, None);
    }

    #[test]
    fn test_leading_national_zero_settles() {
        for input in ["640 02 6070", "8 (-20072(64(1"] {
            let once = normalize(input);
            assert_eq!(normalize(&once.display_text), once, "input {:?}", input);
            assert_eq!(once.digits_only, digits_only(&once.display_text));
        }
    }

    proptest! {
        #[test]
        fn test_normalize_is_idempotent(input in "[0-9 +()-]{0,16}") {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once.display_text), once);
        }
    }

    #[test]
    fn test_phones_match_on_digits() {
        assert!(phones_match("+1 (555) 000-1111", "15550001111"));
        assert!(!phones_match("+1 (555) 000-1111", "+1 555 000 1112"));
        assert_eq!(digits_only("+1 (555) 000-1111"), "15550001111");
    }
}
