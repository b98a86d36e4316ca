//! Country list maintenance.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::client::ClientInner;
use crate::models::{CountryList, CountryListKind};
use crate::totp::TotpCode;
use crate::validate::{validate_country_code, validate_text};
use crate::{Error, Result};

const ENDPOINT: &str = "/auth/countries";

/// Largest dial code the server stores.
pub const MAX_DIAL_CODE: u32 = 16_777_215;

/// A country to add or edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySetup {
    /// List to place the country on
    pub list: CountryListKind,
    /// Display name, 3-32 bytes
    pub name: String,
    /// ISO 3166-1 alpha-3 code
    pub code: String,
    /// ISO 3166-1 alpha-2 code
    pub code_short: String,
    /// International dialling code
    pub dial_code: u32,
}

/// A country list mutation awaiting TOTP confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryCommand {
    /// Add or edit one country
    Setup(CountrySetup),
    /// Move countries to the other list
    Move {
        /// Alpha-3 codes of the countries to move
        codes: Vec<String>,
    },
}

/// Service for the country list under `/auth/countries`.
pub struct CountriesService {
    inner: Arc<ClientInner>,
}

impl CountriesService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get the country list. `cached` lets the server answer from its cache.
    pub async fn list(&self, cached: bool) -> Result<CountryList> {
        self.inner
            .get_field(
                ENDPOINT,
                &json!({"action": "list", "cached": cached}),
                "countries",
            )
            .await
    }

    /// Add a country or replace the one with the same code.
    pub async fn setup(&self, country: &CountrySetup, totp: &TotpCode) -> Result<()> {
        let name = validate_text(&country.name, true)?;
        if name.len() < 3 || name.len() > 32 {
            return Err(Error::InvalidInput(
                "Name must be between 3 and 32 bytes".to_string(),
            ));
        }
        let code = validate_country_code(&country.code, 3)?;
        let code_short = validate_country_code(&country.code_short, 2)?;
        if country.dial_code == 0 || country.dial_code > MAX_DIAL_CODE {
            return Err(Error::InvalidInput("Invalid dial code".to_string()));
        }

        self.inner
            .post(
                ENDPOINT,
                &json!({
                    "action": "setup",
                    "list": country.list,
                    "name": name,
                    "code": code,
                    "codeShort": code_short,
                    "dialCode": country.dial_code,
                    "totp": totp
                }),
            )
            .await?;
        info!(%code, "country saved");
        Ok(())
    }

    /// Move countries between the available and disabled lists. Returns the
    /// number of countries the server moved.
    pub async fn move_countries(&self, codes: &[String], totp: &TotpCode) -> Result<u64> {
        if codes.is_empty() {
            return Err(Error::InvalidInput("No countries selected".to_string()));
        }
        let codes = codes
            .iter()
            .map(|code| validate_country_code(code, 3))
            .collect::<Result<Vec<_>>>()?;

        let count = self
            .inner
            .post(
                ENDPOINT,
                &json!({"action": "status", "countries": codes.join(","), "totp": totp}),
            )
            .await?
            .optional_field::<u64>("count")?
            .unwrap_or(0);
        info!(count, "countries moved");
        Ok(count)
    }

    /// Run a confirmed [`CountryCommand`].
    pub async fn execute(&self, command: CountryCommand, totp: &TotpCode) -> Result<()> {
        match command {
            CountryCommand::Setup(country) => self.setup(&country, totp).await,
            CountryCommand::Move { codes } => self.move_countries(&codes, totp).await.map(|_| ()),
        }
    }
}
