//! Mail, program and system configuration.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::client::ClientInner;
use crate::models::ConfigSection;
use crate::totp::TotpCode;
use crate::{Error, Result};

/// Service for the configuration sections under `/auth/config`.
///
/// Section contents are server-defined, so they are exposed as JSON maps;
/// [`get_as`](Self::get_as) decodes a section into a caller's own type.
///
/// # Example
///
/// ```no_run
/// use adminpanel_rs::models::ConfigSection;
///
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// let mails = client.app_config().get(ConfigSection::Mails).await?;
/// println!("mail service: {:?}", mails.get("service"));
/// # Ok(())
/// # }
/// ```
pub struct AppConfigService {
    inner: Arc<ClientInner>,
}

impl AppConfigService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get a configuration section.
    pub async fn get(&self, section: ConfigSection) -> Result<Map<String, Value>> {
        self.inner
            .get_field(section.endpoint(), &json!({}), "config")
            .await
    }

    /// Get a configuration section decoded into `T`.
    pub async fn get_as<T: DeserializeOwned>(&self, section: ConfigSection) -> Result<T> {
        self.inner
            .get_field(section.endpoint(), &json!({}), "config")
            .await
    }

    /// Update a configuration section.
    ///
    /// `fields` are sent as given with `totp` added; a `totp` key in
    /// `fields` is rejected.
    pub async fn update(
        &self,
        section: ConfigSection,
        fields: Map<String, Value>,
        totp: &TotpCode,
    ) -> Result<()> {
        if fields.contains_key("totp") {
            return Err(Error::InvalidInput(
                "Configuration fields cannot contain \"totp\"".to_string(),
            ));
        }
        let mut payload = fields;
        payload.insert("totp".to_string(), json!(totp));

        self.inner.post(section.endpoint(), &payload).await?;
        info!(section = section.endpoint(), "configuration updated");
        Ok(())
    }
}
