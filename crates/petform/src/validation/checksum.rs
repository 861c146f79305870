//! Check-digit validators for Brazilian national identifiers.

const CNPJ_FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

/// Extracts the decimal digits of `value`, ignoring everything else.
pub fn digits(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Mod-11 check digit: remainder below 2 maps to 0, otherwise `11 - r`.
fn check_digit(digits: &[u32], weights: impl IntoIterator<Item = u32>) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

fn all_identical(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

/// Validates a CPF (individual taxpayer id), masked or not.
pub fn is_valid_cpf(value: &str) -> bool {
    let d = digits(value);
    if d.len() != 11 || all_identical(&d) {
        return false;
    }

    let first = check_digit(&d[..9], (2..=10).rev());
    let second = check_digit(&d[..10], (2..=11).rev());
    d[9] == first && d[10] == second
}

/// Validates a CNPJ (company taxpayer id), masked or not.
pub fn is_valid_cnpj(value: &str) -> bool {
    let d = digits(value);
    if d.len() != 14 || all_identical(&d) {
        return false;
    }

    let first = check_digit(&d[..12], CNPJ_FIRST_WEIGHTS);
    let second = check_digit(&d[..13], CNPJ_SECOND_WEIGHTS);
    d[12] == first && d[13] == second
}
