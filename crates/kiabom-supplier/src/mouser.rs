use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;

use kiabom_sch::Currency;
use kiabom_sch::supplier::{PriceBreak, SupplierQuery, SupplierRecord};

use crate::SupplierKind;
use crate::price::{parse_price, parse_stock};

const MOUSER_SEARCH_URL: &str = "https://api.mouser.com/api/v1/search/partnumber";

/// Mouser Search API client (part number search).
pub struct MouserClient {
    client: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    errors: Vec<ApiError>,
    search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResults {
    #[serde(default)]
    parts: Vec<MouserPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPart {
    manufacturer: Option<String>,
    manufacturer_part_number: Option<String>,
    mouser_part_number: Option<String>,
    availability: Option<String>,
    data_sheet_url: Option<String>,
    #[serde(default)]
    price_breaks: Vec<MouserPriceBreak>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPriceBreak {
    quantity: u64,
    price: String,
    currency: Option<String>,
}

impl MouserClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    fn search(&self, part_number: &str) -> Result<SearchResponse> {
        let response = self
            .client
            .post(MOUSER_SEARCH_URL)
            .query(&[("apiKey", self.api_key.as_str())])
            .json(&serde_json::json!({
                "SearchByPartRequest": {
                    "mouserPartNumber": part_number,
                    "partSearchOptions": "Exact",
                }
            }))
            .send()
            .with_context(|| format!("Failed to send Mouser search request for {part_number}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            anyhow::bail!("Mouser search failed ({}): {}", status, error_text);
        }

        let body: SearchResponse = response
            .json()
            .context("Failed to parse Mouser search response")?;
        if let Some(message) = body.errors.iter().find_map(|e| e.message.as_deref()) {
            anyhow::bail!("Mouser API error: {message}");
        }
        Ok(body)
    }
}

/// Pick the part answering `query` and turn it into a record.
fn record_from_response(query: &str, response: SearchResponse) -> SupplierRecord {
    let parts = response.search_results.map(|r| r.parts).unwrap_or_default();
    let is_orderable = |p: &&MouserPart| {
        p.mouser_part_number
            .as_deref()
            .is_some_and(|pn| !pn.is_empty() && pn != "N/A")
    };
    let exact = |p: &&MouserPart| {
        [&p.manufacturer_part_number, &p.mouser_part_number]
            .iter()
            .any(|pn| pn.as_deref().is_some_and(|pn| pn.eq_ignore_ascii_case(query)))
    };

    let Some(part) = parts
        .iter()
        .filter(is_orderable)
        .find(exact)
        .or_else(|| parts.iter().find(is_orderable))
    else {
        return SupplierRecord::not_found(SupplierKind::Mouser.name(), query);
    };

    let mut record = SupplierRecord::found(SupplierKind::Mouser.name(), query);
    record.price_breaks = part
        .price_breaks
        .iter()
        .filter_map(|pb| {
            Some(PriceBreak {
                quantity: pb.quantity,
                unit_price: parse_price(&pb.price)?,
            })
        })
        .collect();
    record.unit_price = record
        .price_breaks
        .iter()
        .min_by_key(|pb| pb.quantity)
        .map(|pb| pb.unit_price);
    record.currency = part
        .price_breaks
        .iter()
        .find_map(|pb| pb.currency.as_deref())
        .and_then(|c| Currency::from_str(c).ok());
    record.stock = part.availability.as_deref().and_then(parse_stock);
    record.order_code = part.mouser_part_number.clone();
    record.manufacturer = part.manufacturer.clone();
    record.datasheet = part.data_sheet_url.clone().filter(|url| !url.is_empty());
    record
}

impl SupplierQuery for MouserClient {
    fn name(&self) -> &str {
        SupplierKind::Mouser.name()
    }

    fn order_code_field(&self) -> Option<&str> {
        Some(SupplierKind::Mouser.order_code_field())
    }

    fn lookup(
        &self,
        queries: &BTreeSet<String>,
        currency: Currency,
    ) -> Result<HashMap<String, SupplierRecord>> {
        let mut records = HashMap::new();
        let mut last_error = None;

        for query in queries {
            match self.search(query) {
                Ok(response) => {
                    let record = record_from_response(query, response);
                    if let Some(priced_in) = record.currency.filter(|c| *c != currency) {
                        log::warn!("Mouser priced {query} in {priced_in}, not {currency}");
                    }
                    records.insert(query.clone(), record);
                }
                Err(err) => {
                    log::warn!("Mouser lookup for {query} failed: {err:#}");
                    last_error = Some(err);
                }
            }
        }

        // Every single query failing means the service itself is unusable.
        match last_error {
            Some(err) if records.is_empty() => Err(err),
            _ => Ok(records),
        }
    }
}
