//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the tax authority and the engine
//! exchange. Each type validates its format on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Internal identifier of an electronic document record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid document ID '{s}': {e}"))
    }
}

/// Company (tenant) identifier
///
/// Company scoping is the unit of isolation for batch processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new CompanyId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Company ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the company ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for CompanyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Issuer tax identifier (RUC), exactly 13 digits
///
/// # Examples
///
/// ```
/// use sri_edi::domain::ids::TaxId;
///
/// let ruc = TaxId::new("1790012345001").unwrap();
/// assert_eq!(ruc.as_str(), "1790012345001");
/// assert!(TaxId::new("17900").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaxId(String);

impl TaxId {
    /// Creates a new TaxId, checking it is 13 ASCII digits
    pub fn new(ruc: impl Into<String>) -> Result<Self, String> {
        let ruc = ruc.into();
        if ruc.len() != 13 || !ruc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Tax ID must be exactly 13 digits, got '{ruc}'"));
        }
        Ok(Self(ruc))
    }

    /// Returns the tax ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaxId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxId> for String {
    fn from(value: TaxId) -> Self {
        value.0
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// 49-digit access key identifying a document submission
///
/// Construction verifies the length, the digit alphabet and the trailing
/// modulus-11 check digit.
///
/// # Examples
///
/// ```
/// use sri_edi::domain::ids::AccessKey;
///
/// let key = AccessKey::new("0101202401179001234500120010010000001231234567810").unwrap();
/// assert_eq!(key.check_digit(), 0);
/// assert!(AccessKey::new("0101202401179001234500120010010000001231234567811").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessKey(String);

impl AccessKey {
    /// Number of digits in a complete key
    pub const LENGTH: usize = 49;

    /// Creates a new AccessKey from its 49-digit representation
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.len() != Self::LENGTH || !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!(
                "Access key must be exactly {} digits, got {} characters",
                Self::LENGTH,
                key.len()
            ));
        }
        if !crate::core::access_key::verify(&key) {
            return Err(format!("Access key {key} has an invalid check digit"));
        }
        Ok(Self(key))
    }

    /// Returns the access key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing check digit
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[Self::LENGTH - 1] - b'0'
    }

    /// Environment digit embedded at position 24
    pub fn environment_digit(&self) -> char {
        self.0.as_bytes()[23] as char
    }
}

impl TryFrom<String> for AccessKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccessKey> for String {
    fn from(value: AccessKey) -> Self {
        value.0
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccessKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl AsRef<str> for AccessKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Point of emission: 3-digit establishment plus 3-digit emission point
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmissionPoint {
    establishment: String,
    point: String,
}

impl EmissionPoint {
    /// Creates a new EmissionPoint from its two 3-digit codes
    pub fn new(establishment: impl Into<String>, point: impl Into<String>) -> Result<Self, String> {
        let establishment = establishment.into();
        let point = point.into();
        for (label, value) in [("establishment", &establishment), ("emission point", &point)] {
            if value.len() != 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("{label} code must be exactly 3 digits, got '{value}'"));
            }
        }
        Ok(Self {
            establishment,
            point,
        })
    }

    /// Establishment code (`estab`)
    pub fn establishment(&self) -> &str {
        &self.establishment
    }

    /// Emission point code (`ptoEmi`)
    pub fn point(&self) -> &str {
        &self.point
    }

    /// Six-digit serial used inside the access key
    pub fn serial(&self) -> String {
        format!("{}{}", self.establishment, self.point)
    }
}

impl fmt::Display for EmissionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.establishment, self.point)
    }
}

impl FromStr for EmissionPoint {
    type Err = String;

    /// Parses `001-002` or the compact `001002` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('-') {
            Some((estab, point)) => Self::new(estab, point),
            None if s.len() == 6 => Self::new(&s[..3], &s[3..]),
            None => Err(format!("Invalid emission point '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_roundtrip_display() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_company_id_empty() {
        assert!(CompanyId::new("").is_err());
        assert!(CompanyId::new("  ").is_err());
        assert_eq!(CompanyId::new("acme").unwrap().as_str(), "acme");
    }

    #[test]
    fn test_tax_id_validation() {
        assert!(TaxId::new("1790012345001").is_ok());
        assert!(TaxId::new("179001234500").is_err());
        assert!(TaxId::new("17900123450AB").is_err());
    }

    #[test]
    fn test_access_key_validation() {
        let key = AccessKey::new("0101202401179001234500120010010000001231234567810").unwrap();
        assert_eq!(key.environment_digit(), '2');
        assert_eq!(key.check_digit(), 0);

        assert!(AccessKey::new("123").is_err());
        assert!(AccessKey::new("0101202401179001234500120010010000001231234567819").is_err());
        assert!(AccessKey::new("010120240117900123450012001001000000123123456781a").is_err());
    }

    #[test]
    fn test_access_key_serde_rejects_bad_key() {
        let json = "\"0101202401179001234500120010010000001231234567815\"";
        assert!(serde_json::from_str::<AccessKey>(json).is_err());
    }

    #[test]
    fn test_emission_point_parsing() {
        let point: EmissionPoint = "001-002".parse().unwrap();
        assert_eq!(point.establishment(), "001");
        assert_eq!(point.point(), "002");
        assert_eq!(point.serial(), "001002");
        assert_eq!(point.to_string(), "001-002");

        let compact: EmissionPoint = "003004".parse().unwrap();
        assert_eq!(compact.serial(), "003004");

        assert!("01-002".parse::<EmissionPoint>().is_err());
        assert!("abc".parse::<EmissionPoint>().is_err());
    }
}
