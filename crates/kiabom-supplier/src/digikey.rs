use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use kiabom_sch::Currency;
use kiabom_sch::supplier::{PriceBreak, SupplierQuery, SupplierRecord};

use crate::SupplierKind;
use crate::price::decimal_from_json;

const DIGIKEY_TOKEN_URL: &str = "https://api.digikey.com/v1/oauth2/token";
const DIGIKEY_PRODUCT_DETAILS_URL: &str = "https://api.digikey.com/products/v4/search/";

/// DigiKey Product Information v4 client using the client-credentials flow.
pub struct DigiKeyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductDetails {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    manufacturer: Option<Manufacturer>,
    datasheet_url: Option<String>,
    #[serde(default)]
    quantity_available: Option<u64>,
    #[serde(default)]
    product_variations: Vec<ProductVariation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Manufacturer {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductVariation {
    digi_key_product_number: Option<String>,
    #[serde(default)]
    standard_pricing: Vec<StandardPrice>,
    #[serde(rename = "QuantityAvailableforPackageType")]
    quantity_available: Option<u64>,
    minimum_order_quantity: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StandardPrice {
    break_quantity: u64,
    unit_price: serde_json::Value,
}

impl DigiKeyClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    fn fetch_token(&self) -> Result<String> {
        let response = self
            .client
            .post(DIGIKEY_TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .context("Failed to send DigiKey token request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            anyhow::bail!("DigiKey authentication failed ({}): {}", status, error_text);
        }

        let token: TokenResponse = response
            .json()
            .context("Failed to parse DigiKey token response")?;
        Ok(token.access_token)
    }

    fn token(&self) -> Result<String> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| anyhow::anyhow!("DigiKey token lock poisoned"))?;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.fetch_token()?;
        *guard = Some(token.clone());
        Ok(token)
    }

    fn product_details(&self, part_number: &str, currency: Currency) -> Result<Option<Product>> {
        let mut url = Url::parse(DIGIKEY_PRODUCT_DETAILS_URL)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("DigiKey base URL cannot carry a path"))?
            .pop_if_empty()
            .push(part_number)
            .push("productdetails");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token()?)
            .header("X-DIGIKEY-Client-Id", &self.client_id)
            .header("X-DIGIKEY-Locale-Currency", currency.code())
            .send()
            .with_context(|| format!("Failed to send DigiKey request for {part_number}"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            anyhow::bail!("DigiKey product details failed ({}): {}", status, error_text);
        }

        let details: ProductDetails = response
            .json()
            .context("Failed to parse DigiKey product details")?;
        Ok(details.product)
    }
}

/// Turn a product into a record, preferring the package variation with the
/// smallest minimum order (cut tape over full reels).
fn record_from_product(query: &str, product: Product, currency: Currency) -> SupplierRecord {
    let Some(variation) = product
        .product_variations
        .iter()
        .filter(|v| v.digi_key_product_number.is_some())
        .min_by_key(|v| v.minimum_order_quantity.unwrap_or(u64::MAX))
    else {
        return SupplierRecord::not_found(SupplierKind::DigiKey.name(), query);
    };

    let mut record = SupplierRecord::found(SupplierKind::DigiKey.name(), query);
    record.price_breaks = variation
        .standard_pricing
        .iter()
        .filter_map(|p| {
            Some(PriceBreak {
                quantity: p.break_quantity,
                unit_price: decimal_from_json(&p.unit_price)?,
            })
        })
        .collect();
    record.unit_price = record
        .price_breaks
        .iter()
        .min_by_key(|pb| pb.quantity)
        .map(|pb| pb.unit_price);
    record.currency = Some(currency);
    record.stock = variation.quantity_available.or(product.quantity_available);
    record.order_code = variation.digi_key_product_number.clone();
    record.manufacturer = product.manufacturer.and_then(|m| m.name);
    record.datasheet = product.datasheet_url.filter(|url| !url.is_empty());
    record
}

impl SupplierQuery for DigiKeyClient {
    fn name(&self) -> &str {
        SupplierKind::DigiKey.name()
    }

    fn order_code_field(&self) -> Option<&str> {
        Some(SupplierKind::DigiKey.order_code_field())
    }

    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        currency: Currency,
    ) -> Result<HashMap<String, SupplierRecord>> {
        // Without a token nothing below can succeed.
        self.token()?;

        let mut records = HashMap::new();
        let mut last_error = None;
        for query in queries {
            match self.product_details(query, currency) {
                Ok(Some(product)) => {
                    records.insert(query.clone(), record_from_product(query, product, currency));
                }
                Ok(None) => {
                    log::debug!("DigiKey has no product {query}");
                    records.insert(
                        query.clone(),
                        SupplierRecord::not_found("DigiKey", query.as_str()),
                    );
                }
                Err(err) => {
                    log::warn!("DigiKey lookup for {query} failed: {err:#}");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if records.is_empty() => Err(err),
            _ => Ok(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PRODUCT: &str = r#"{
        "Product": {
            "Description": {"ProductDescription": "RES 10K OHM 1% 1/10W 0603"},
            "Manufacturer": {"Id": 13, "Name": "YAGEO"},
            "ManufacturerProductNumber": "RC0603FR-0710KL",
            "DatasheetUrl": "https://www.yageo.com/upload/media/product/RC.pdf",
            "QuantityAvailable": 4000000,
            "ProductVariations": [
                {
                    "DigiKeyProductNumber": "311-10.0KHRTR-ND",
                    "PackageType": {"Name": "Tape & Reel (TR)"},
                    "StandardPricing": [
                        {"BreakQuantity": 5000, "UnitPrice": 0.00276, "TotalPrice": 13.8}
                    ],
                    "QuantityAvailableforPackageType": 3500000,
                    "MinimumOrderQuantity": 5000
                },
                {
                    "DigiKeyProductNumber": "311-10.0KHRCT-ND",
                    "PackageType": {"Name": "Cut Tape (CT)"},
                    "StandardPricing": [
                        {"BreakQuantity": 1, "UnitPrice": 0.1, "TotalPrice": 0.1},
                        {"BreakQuantity": 10, "UnitPrice": 0.019, "TotalPrice": 0.19}
                    ],
                    "QuantityAvailableforPackageType": 500000,
                    "MinimumOrderQuantity": 1
                }
            ]
        }
    }"#;

    #[test]
    fn test_record_from_product_prefers_cut_tape() {
        let details: ProductDetails = serde_json::from_str(PRODUCT).unwrap();
        let record = record_from_product("RC0603FR-0710KL", details.product.unwrap(), Currency::Usd);
        assert!(record.found);
        assert_eq!(record.order_code.as_deref(), Some("311-10.0KHRCT-ND"));
        assert_eq!(record.stock, Some(500_000));
        assert_eq!(record.manufacturer.as_deref(), Some("YAGEO"));
        assert_eq!(record.unit_price, Some(dec!(0.1)));
        assert_eq!(record.unit_price_at_qty(25), Some(dec!(0.019)));
        assert_eq!(record.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_product_without_variations_is_not_found() {
        let details: ProductDetails =
            serde_json::from_str(r#"{"Product": {"ProductVariations": []}}"#).unwrap();
        let record = record_from_product("X", details.product.unwrap(), Currency::Gbp);
        assert!(!record.found);
    }
}
