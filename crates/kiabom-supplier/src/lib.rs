//! Supplier lookups for KiABOM.
//!
//! Each supplier implements [`kiabom_sch::supplier::SupplierQuery`] over a
//! blocking HTTP client. [`cache::CachedSupplier`] wraps any of them with an
//! on-disk JSON cache, and [`datasheet`] downloads the datasheets of the
//! finished BOM.

pub mod cache;
pub mod datasheet;
pub mod digikey;
pub mod mouser;
mod price;

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kiabom_sch::supplier::SupplierQuery;

pub use cache::CachedSupplier;
pub use digikey::DigiKeyClient;
pub use mouser::MouserClient;
pub use price::{parse_price, parse_stock};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum SupplierError {
    #[error("Supplier '{0}' is not supported. Supported suppliers are Mouser and DigiKey")]
    Unsupported(String),

    #[error("{supplier} needs credentials: set {hint}")]
    MissingCredentials {
        supplier: &'static str,
        hint: &'static str,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupplierKind {
    Mouser,
    DigiKey,
}

impl SupplierKind {
    pub const ALL: [SupplierKind; 2] = [SupplierKind::Mouser, SupplierKind::DigiKey];

    pub fn name(self) -> &'static str {
        match self {
            SupplierKind::Mouser => "Mouser",
            SupplierKind::DigiKey => "DigiKey",
        }
    }

    /// Component field carrying this supplier's own order code.
    pub fn order_code_field(self) -> &'static str {
        match self {
            SupplierKind::Mouser => "Mouser#",
            SupplierKind::DigiKey => "DigiKey#",
        }
    }
}

impl FromStr for SupplierKind {
    type Err = SupplierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mouser" => Ok(SupplierKind::Mouser),
            "digikey" | "digi-key" => Ok(SupplierKind::DigiKey),
            _ => Err(SupplierError::Unsupported(s.to_string())),
        }
    }
}

impl std::fmt::Display for SupplierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// API credentials for every supported supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub mouser_api_key: Option<String>,
    #[serde(default)]
    pub digikey_client_id: Option<String>,
    #[serde(default)]
    pub digikey_client_secret: Option<String>,
}

impl Credentials {
    /// Override with `MOUSER_API_KEY`, `DIGIKEY_CLIENT_ID` and
    /// `DIGIKEY_CLIENT_SECRET` when they are set.
    pub fn with_env(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("MOUSER_API_KEY") {
            self.mouser_api_key = Some(key);
        }
        if let Some(id) = non_empty("DIGIKEY_CLIENT_ID") {
            self.digikey_client_id = Some(id);
        }
        if let Some(secret) = non_empty("DIGIKEY_CLIENT_SECRET") {
            self.digikey_client_secret = Some(secret);
        }
        self
    }
}

/// Build the live client for `kind`.
pub fn connect(
    kind: SupplierKind,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Box<dyn SupplierQuery>, SupplierError> {
    match kind {
        SupplierKind::Mouser => {
            let api_key = credentials.mouser_api_key.clone().ok_or(
                SupplierError::MissingCredentials {
                    supplier: "Mouser",
                    hint: "MOUSER_API_KEY or suppliers.mouser.api_key",
                },
            )?;
            Ok(Box::new(MouserClient::new(api_key, timeout)?))
        }
        SupplierKind::DigiKey => {
            let (Some(id), Some(secret)) = (
                credentials.digikey_client_id.clone(),
                credentials.digikey_client_secret.clone(),
            ) else {
                return Err(SupplierError::MissingCredentials {
                    supplier: "DigiKey",
                    hint: "DIGIKEY_CLIENT_ID and DIGIKEY_CLIENT_SECRET, or suppliers.digikey.*",
                });
            };
            Ok(Box::new(DigiKeyClient::new(id, secret, timeout)?))
        }
    }
}
