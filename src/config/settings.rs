//! Academy settings loading from academy.toml
//!
//! Policy knobs that the business may want to tune without a code change: whether
//! attendance may push a credit balance negative, the low-balance alert threshold,
//! rental periods and late fees, tax rates, and the instruments seeded on first run.
//! Every section is optional; missing values fall back to the defaults below.

use crate::entities::sea_orm_active_enums::{RentalPeriod, TaxType};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_SETTINGS_PATH: &str = "academy.toml";

/// Upper bound for every day-count setting.
const MAX_DAYS: i64 = 366;

/// The whole academy.toml file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcademySettings {
    /// Credit ledger behavior
    pub ledger: LedgerPolicy,
    /// Dashboard alert thresholds
    pub alerts: AlertSettings,
    /// Rental terms and late fees
    pub rentals: RentalPolicy,
    /// Sales tax rates
    pub taxes: TaxRates,
    /// Instruments created on startup if missing
    pub instruments: Vec<String>,
}

/// Ledger behavior when a student runs out of credits.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    /// Let attendance deductions take a balance below zero instead of failing
    pub allow_negative_balance: bool,
}

/// Thresholds for dashboard alerts.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Balances at or below this many credits raise a credit alert
    pub low_balance_threshold: i32,
    /// How many days ahead "upcoming classes" looks
    pub upcoming_days: i64,
    /// Overdue rentals older than this many days are critical
    pub critical_overdue_days: i64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            low_balance_threshold: 2,
            upcoming_days: 7,
            critical_overdue_days: 7,
        }
    }
}

/// Rental periods and late-fee schedule.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RentalPolicy {
    /// Length of a weekly rental
    pub weekly_days: i64,
    /// Length of a monthly rental
    pub monthly_days: i64,
    /// Late fee charged per day past the due date, in dollars
    pub late_fee_per_day: f64,
}

impl Default for RentalPolicy {
    fn default() -> Self {
        Self {
            weekly_days: 7,
            monthly_days: 30,
            late_fee_per_day: 2.0,
        }
    }
}

impl RentalPolicy {
    /// Number of days a rental period lasts.
    #[must_use]
    pub const fn period_days(&self, period: RentalPeriod) -> i64 {
        match period {
            RentalPeriod::Weekly => self.weekly_days,
            RentalPeriod::Monthly => self.monthly_days,
        }
    }
}

/// Sales tax rates as fractions.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TaxRates {
    /// Harmonized sales tax
    pub hst: f64,
    /// Goods and services tax
    pub gst: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            hst: 0.13,
            gst: 0.05,
        }
    }
}

impl TaxRates {
    /// Rate applied for a tax regime.
    #[must_use]
    pub const fn rate_for(&self, tax_type: TaxType) -> f64 {
        match tax_type {
            TaxType::Hst => self.hst,
            TaxType::Gst => self.gst,
            TaxType::Exempt => 0.0,
        }
    }
}

impl AcademySettings {
    fn validate(self) -> Result<Self> {
        if self.alerts.upcoming_days < 0 || self.alerts.critical_overdue_days < 0 {
            return Err(Error::Config {
                message: "Alert day counts cannot be negative".to_string(),
            });
        }
        if self.rentals.weekly_days <= 0 || self.rentals.monthly_days <= 0 {
            return Err(Error::Config {
                message: "Rental periods must be at least one day".to_string(),
            });
        }
        let day_counts = [
            self.alerts.upcoming_days,
            self.alerts.critical_overdue_days,
            self.rentals.weekly_days,
            self.rentals.monthly_days,
        ];
        if day_counts.iter().any(|&days| days > MAX_DAYS) {
            return Err(Error::Config {
                message: format!("Day counts cannot exceed {MAX_DAYS}"),
            });
        }
        for rate in [
            self.rentals.late_fee_per_day,
            self.taxes.hst,
            self.taxes.gst,
        ] {
            if rate < 0.0 || !rate.is_finite() {
                return Err(Error::InvalidAmount { amount: rate });
            }
        }
        Ok(self)
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML is invalid or a value is out of range.
pub fn parse_settings(contents: &str) -> Result<AcademySettings> {
    let settings: AcademySettings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse academy settings: {e}"),
    })?;
    settings.validate()
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value is out of range
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<AcademySettings> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load academy settings from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `ACADEMY_CONFIG` (or ./academy.toml), falling back to
/// defaults when the file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn load_default_settings() -> Result<AcademySettings> {
    let path =
        std::env::var("ACADEMY_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        tracing::warn!("No settings file at {}, using defaults", path);
        Ok(AcademySettings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            instruments = ["Piano", "Violin"]

            [ledger]
            allow_negative_balance = true

            [alerts]
            low_balance_threshold = 3

            [rentals]
            late_fee_per_day = 5.0

            [taxes]
            hst = 0.15
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert!(settings.ledger.allow_negative_balance);
        assert_eq!(settings.alerts.low_balance_threshold, 3);
        assert_eq!(settings.alerts.upcoming_days, 7);
        assert_eq!(settings.rentals.late_fee_per_day, 5.0);
        assert_eq!(settings.rentals.monthly_days, 30);
        assert_eq!(settings.taxes.rate_for(TaxType::Hst), 0.15);
        assert_eq!(settings.taxes.rate_for(TaxType::Gst), 0.05);
        assert_eq!(settings.instruments, vec!["Piano", "Violin"]);
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert!(!settings.ledger.allow_negative_balance);
        assert_eq!(settings.alerts.low_balance_threshold, 2);
        assert_eq!(settings.rentals.period_days(RentalPeriod::Weekly), 7);
        assert_eq!(settings.rentals.period_days(RentalPeriod::Monthly), 30);
        assert_eq!(settings.taxes.rate_for(TaxType::Exempt), 0.0);
        assert!(settings.instruments.is_empty());
    }

    #[test]
    fn test_rejects_negative_late_fee() {
        let result = parse_settings("[rentals]\nlate_fee_per_day = -1.0\n");
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_rejects_oversized_day_counts() {
        let result = parse_settings("[alerts]\nupcoming_days = 9223372036854775807\n");
        assert!(matches!(result, Err(Error::Config { .. })));
        let result = parse_settings("[rentals]\nmonthly_days = 367\n");
        assert!(matches!(result, Err(Error::Config { .. })));
        assert!(parse_settings("[alerts]\nupcoming_days = 366\n").is_ok());
    }

    #[test]
    fn test_rejects_invalid_toml() {
        let result = parse_settings("[ledger\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
