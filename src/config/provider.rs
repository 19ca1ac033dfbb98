//! Company settings, read fresh for every scheduled pass

use super::loader::load_config;
use super::schema::{CompanySettings, EdiConfig};
use crate::domain::{EdiError, Result};
use std::path::PathBuf;

/// Source of company-scoped settings
///
/// Implementations must not cache across calls: limits such as
/// `max_attempts` are read once at the start of each pass.
pub trait SettingsProvider: Send + Sync {
    /// Every configured company, in configuration order
    fn companies(&self) -> Result<Vec<CompanySettings>>;

    /// Settings of a single company
    fn company(&self, id: &str) -> Result<CompanySettings> {
        self.companies()?
            .into_iter()
            .find(|company| company.id == id)
            .ok_or_else(|| EdiError::NotFound(format!("Company '{}' is not configured", id)))
    }
}

/// Settings held in memory
#[derive(Debug, Clone)]
pub struct StaticSettings {
    companies: Vec<CompanySettings>,
}

impl StaticSettings {
    pub fn new(companies: Vec<CompanySettings>) -> Self {
        Self { companies }
    }
}

impl From<&EdiConfig> for StaticSettings {
    fn from(config: &EdiConfig) -> Self {
        Self::new(config.companies.clone())
    }
}

impl SettingsProvider for StaticSettings {
    fn companies(&self) -> Result<Vec<CompanySettings>> {
        Ok(self.companies.clone())
    }
}

/// Settings re-read from the configuration file on every call
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsProvider for FileSettings {
    fn companies(&self) -> Result<Vec<CompanySettings>> {
        Ok(load_config(&self.path)?.companies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_config(file: &NamedTempFile, max_attempts: u32) {
        let content = format!(
            r#"
[[companies]]
id = "acme"
ruc = "1790012345001"
legal_name = "ACME S.A."
matrix_address = "Quito"
max_attempts = {max_attempts}
"#
        );
        std::fs::write(file.path(), content).unwrap();
    }

    #[test]
    fn test_file_settings_are_not_cached() {
        let file = NamedTempFile::new().unwrap();
        write_config(&file, 3);
        let provider = FileSettings::new(file.path());
        assert_eq!(provider.company("acme").unwrap().max_attempts, 3);

        write_config(&file, 7);
        assert_eq!(provider.company("acme").unwrap().max_attempts, 7);
    }

    #[test]
    fn test_unknown_company() {
        let provider = StaticSettings::new(Vec::new());
        assert!(matches!(
            provider.company("ghost"),
            Err(EdiError::NotFound(_))
        ));
    }
}
