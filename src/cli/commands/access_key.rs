//! Access key command implementation
//!
//! Generates a key from its parts, or verifies the check digit of an
//! existing one. Works without a configuration file.

use super::engine::{EXIT_CONFIGURATION, EXIT_OK, EXIT_PARTIAL};
use crate::core::access_key::{self, AccessKeyInput};
use crate::domain::{AccessKey, DocumentKind, EmissionPoint, Environment, TaxId};
use chrono::NaiveDate;
use clap::Args;

/// Arguments for the access-key command
#[derive(Args, Debug)]
pub struct AccessKeyArgs {
    /// Verify this key instead of generating one
    #[arg(long, conflicts_with_all = ["date", "kind", "ruc", "emission_point", "sequential"])]
    pub verify: Option<String>,

    /// Issue date (YYYY-MM-DD)
    #[arg(long, required_unless_present = "verify")]
    pub date: Option<NaiveDate>,

    /// Document kind code (01, 03, 04, 05, 07)
    #[arg(long, required_unless_present = "verify")]
    pub kind: Option<DocumentKind>,

    /// Issuer RUC
    #[arg(long, required_unless_present = "verify")]
    pub ruc: Option<String>,

    /// Target environment (test or production)
    #[arg(long, default_value = "test")]
    pub environment: Environment,

    /// Point of emission as `001-001`
    #[arg(long, required_unless_present = "verify")]
    pub emission_point: Option<EmissionPoint>,

    /// Sequential number
    #[arg(long, required_unless_present = "verify")]
    pub sequential: Option<u64>,

    /// Numeric code, random when omitted
    #[arg(long)]
    pub numeric_code: Option<u32>,
}

impl AccessKeyArgs {
    /// Execute the access-key command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        if let Some(key) = &self.verify {
            return Ok(Self::verify(key));
        }

        let input = match self.input() {
            Ok(input) => input,
            Err(message) => {
                println!("❌ {message}");
                return Ok(EXIT_CONFIGURATION);
            }
        };

        match access_key::generate(&input) {
            Ok(key) => {
                println!("{key}");
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ {e}");
                Ok(EXIT_CONFIGURATION)
            }
        }
    }

    fn input(&self) -> Result<AccessKeyInput, String> {
        let missing = |name: &str| format!("--{name} is required");
        Ok(AccessKeyInput {
            issue_date: self.date.ok_or_else(|| missing("date"))?,
            kind: self.kind.ok_or_else(|| missing("kind"))?,
            tax_id: TaxId::new(self.ruc.clone().ok_or_else(|| missing("ruc"))?)?,
            environment: self.environment,
            emission_point: self
                .emission_point
                .clone()
                .ok_or_else(|| missing("emission-point"))?,
            sequential: self.sequential.ok_or_else(|| missing("sequential"))?,
            random: self.numeric_code.unwrap_or_else(access_key::random_fragment),
        })
    }

    fn verify(key: &str) -> i32 {
        match AccessKey::new(key.trim()) {
            Ok(key) => {
                let environment = key
                    .environment_digit()
                    .to_string()
                    .parse::<Environment>()
                    .map(|env| env.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                println!("✅ Access key is valid");
                println!("   Environment: {environment}");
                println!("   Check digit: {}", key.check_digit());
                EXIT_OK
            }
            Err(e) => {
                println!("❌ Invalid access key");
                println!("   {e}");
                EXIT_PARTIAL
            }
        }
    }
}
