//! Input masking and case formatting.
//!
//! Raw values are canonical: they hold only the characters a mask consumes.
//! Display values are derived from them and never stored back.

use std::borrow::Cow;

use crate::schema::{FieldDefinition, FieldFormatting, FieldType};

/// Placeholder consumed by one alphanumeric input character.
pub const PLACEHOLDER: char = '#';

pub const CPF_MASK: &str = "###.###.###-##";
pub const CNPJ_MASK: &str = "##.###.###/####-##";
pub const CEP_MASK: &str = "#####-###";
pub const LANDLINE_MASK: &str = "(##) ####-####";
pub const MOBILE_MASK: &str = "(##) #####-####";

/// Formats `raw` for display using `pattern`.
///
/// Placeholders consume input left to right, literals are copied while
/// input remains. Input past the last placeholder is dropped.
pub fn apply_mask(raw: &str, pattern: &str) -> String {
    let mut input = raw.chars().filter(|c| c.is_alphanumeric()).peekable();
    let mut display = String::with_capacity(pattern.len());

    for slot in pattern.chars() {
        if input.peek().is_none() {
            break;
        }
        if slot == PLACEHOLDER {
            if let Some(c) = input.next() {
                display.push(c);
            }
        } else {
            display.push(slot);
        }
    }

    display
}

/// Removes mask literals, keeping only alphanumeric characters.
pub fn strip_mask(display: &str) -> String {
    display.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Number of placeholders in a pattern.
pub fn capacity(pattern: &str) -> usize {
    pattern.chars().filter(|&c| c == PLACEHOLDER).count()
}

/// Returns whether `pattern` can round-trip through [`strip_mask`].
pub fn is_valid_pattern(pattern: &str) -> bool {
    capacity(pattern) > 0
        && pattern
            .chars()
            .all(|c| c == PLACEHOLDER || !c.is_alphanumeric())
}

/// Mask resolved for a particular field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskSpec<'a> {
    /// Fixed pattern.
    Pattern(Cow<'a, str>),
    /// Brazilian phone: landline or mobile layout picked by digit count.
    Phone,
}

impl<'a> MaskSpec<'a> {
    /// Resolves the mask for a field, if it has one.
    ///
    /// An explicit `formatting.mask` wins; otherwise the field id (or the
    /// PHONE type) selects a conventional mask.
    pub fn for_field(field: &'a FieldDefinition) -> Option<Self> {
        if let Some(mask) = field.formatting.as_ref().and_then(|f| f.mask.as_deref()) {
            return Some(Self::Pattern(Cow::Borrowed(mask)));
        }

        let id = field.id.to_ascii_lowercase();
        if id.ends_with("cnpj") {
            Some(Self::Pattern(Cow::Borrowed(CNPJ_MASK)))
        } else if id.ends_with("cpf") {
            Some(Self::Pattern(Cow::Borrowed(CPF_MASK)))
        } else if id.ends_with("cep") || id.ends_with("zip") || id.ends_with("zipcode") {
            Some(Self::Pattern(Cow::Borrowed(CEP_MASK)))
        } else if field.field_type == FieldType::Phone
            || id.ends_with("phone")
            || id.ends_with("telefone")
        {
            Some(Self::Phone)
        } else {
            None
        }
    }

    /// Maximum number of raw characters the mask accepts.
    pub fn capacity(&self) -> usize {
        match self {
            Self::Pattern(pattern) => capacity(pattern),
            Self::Phone => capacity(MOBILE_MASK),
        }
    }

    /// Formats a raw value.
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Self::Pattern(pattern) => apply_mask(raw, pattern),
            Self::Phone => {
                let pattern = if raw.chars().count() > capacity(LANDLINE_MASK) {
                    MOBILE_MASK
                } else {
                    LANDLINE_MASK
                };
                apply_mask(raw, pattern)
            }
        }
    }
}

/// Returns whether a field's value goes through a mask.
pub fn is_masked(field: &FieldDefinition) -> bool {
    MaskSpec::for_field(field).is_some()
}

/// Applies `capitalize` and `uppercase` flags.
pub fn apply_case(value: &str, formatting: &FieldFormatting) -> String {
    if formatting.uppercase {
        return value.to_uppercase();
    }
    if formatting.capitalize {
        return capitalize_words(value);
    }
    value.to_string()
}

/// Title-cases every whitespace separated word: the first letter is
/// upper-cased and the rest lower-cased.
pub fn capitalize_words(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace();
    }
    out
}

/// Canonical and display forms of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub raw: String,
    pub display: String,
}

/// Normalizes user input for `field`.
///
/// Accepts either raw or already-masked text.
pub fn format_input(field: &FieldDefinition, input: &str) -> Formatted {
    let cased = match &field.formatting {
        Some(formatting) => apply_case(input, formatting),
        None => input.to_string(),
    };

    match MaskSpec::for_field(field) {
        Some(mask) => {
            let raw: String = strip_mask(&cased).chars().take(mask.capacity()).collect();
            let display = mask.apply(&raw);
            Formatted { raw, display }
        }
        None => Formatted {
            display: cased.clone(),
            raw: cased,
        },
    }
}
