//! Access key generation
//!
//! The access key is the 49-digit identifier of a submission:
//!
//! ```text
//! ddMMyyyy | codDoc | RUC | ambiente | estab+ptoEmi | secuencial | código numérico | tipoEmision | dígito
//!     8    |   2    | 13  |    1     |      6       |     9      |        8        |      1      |   1
//! ```
//!
//! The trailing digit is a modulus-11 check digit over the first 48 digits.

use crate::domain::{
    AccessKey, DocumentKind, EdiError, EmissionPoint, Environment, Result, TaxId,
};
use chrono::NaiveDate;
use rand::Rng;

/// Emission kind, always normal emission (contingency is not supported)
pub const EMISSION_KIND: char = '1';

const MAX_SEQUENTIAL: u64 = 999_999_999;
const MAX_RANDOM: u32 = 99_999_999;

/// Inputs of a key
#[derive(Debug, Clone)]
pub struct AccessKeyInput {
    pub issue_date: NaiveDate,
    pub kind: DocumentKind,
    pub tax_id: TaxId,
    pub environment: Environment,
    pub emission_point: EmissionPoint,
    pub sequential: u64,
    /// Numeric code, at most 8 digits
    pub random: u32,
}

/// Builds the 48-digit prefix and appends its check digit
///
/// # Examples
///
/// ```
/// use sri_edi::core::access_key::{generate, AccessKeyInput};
/// use sri_edi::domain::{DocumentKind, EmissionPoint, Environment, TaxId};
/// use chrono::NaiveDate;
///
/// let key = generate(&AccessKeyInput {
///     issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     kind: DocumentKind::Invoice,
///     tax_id: TaxId::new("1790012345001").unwrap(),
///     environment: Environment::Production,
///     emission_point: EmissionPoint::new("001", "001").unwrap(),
///     sequential: 123,
///     random: 12_345_678,
/// })
/// .unwrap();
/// assert_eq!(key.as_str(), "0101202401179001234500120010010000001231234567810");
/// ```
pub fn generate(input: &AccessKeyInput) -> Result<AccessKey> {
    if input.sequential > MAX_SEQUENTIAL {
        return Err(EdiError::Validation(format!(
            "Sequential {} does not fit in 9 digits",
            input.sequential
        )));
    }
    if input.random > MAX_RANDOM {
        return Err(EdiError::Validation(format!(
            "Numeric code {} does not fit in 8 digits",
            input.random
        )));
    }

    let mut key = format!(
        "{}{}{}{}{}{:09}{:08}{}",
        input.issue_date.format("%d%m%Y"),
        input.kind.code(),
        input.tax_id.as_str(),
        input.environment.digit(),
        input.emission_point.serial(),
        input.sequential,
        input.random,
        EMISSION_KIND,
    );
    let digit = check_digit(&key)?;
    key.push(char::from(b'0' + digit));

    AccessKey::new(key).map_err(EdiError::Validation)
}

/// Computes the modulus-11 check digit of a digit string
///
/// Digits are weighted right to left with the cycle 2..=7. A raw result of
/// 11 maps to 0 and 10 maps to 1.
pub fn check_digit(digits: &str) -> Result<u8> {
    let mut sum: u32 = 0;
    let mut weight: u32 = 2;
    for ch in digits.chars().rev() {
        let value = ch.to_digit(10).ok_or_else(|| {
            EdiError::Validation(format!("Non-digit character '{ch}' in access key"))
        })?;
        sum += value * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }

    let digit = match 11 - (sum % 11) {
        11 => 0,
        10 => 1,
        d => d,
    };
    Ok(digit as u8)
}

/// Whether the last digit of `key` is the check digit of the rest
pub fn verify(key: &str) -> bool {
    if key.len() < 2 || !key.is_ascii() {
        return false;
    }
    let (body, last) = key.split_at(key.len() - 1);
    match (check_digit(body), last.parse::<u8>()) {
        (Ok(expected), Ok(actual)) => expected == actual,
        _ => false,
    }
}

/// Random numeric code in `1..=99_999_999`
pub fn random_fragment() -> u32 {
    rand::thread_rng().gen_range(1..=MAX_RANDOM)
}
