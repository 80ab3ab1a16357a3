use crate::{
    Error,
    catalog::{CatalogError, LabelResolver, field_from_coefficients, query_coefficients},
    field::Field,
    label::Label,
    serialize::decimal::Decimal,
};
use num_bigint::BigInt;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

///
/// LmfdbCatalog
///
/// Blocking client for the LMFDB number field API.
///

#[derive(Clone, Debug)]
pub struct LmfdbCatalog {
    client: Client,
    base_url: String,
}

impl LmfdbCatalog {
    const NAME: &'static str = "lmfdb";

    pub const DEFAULT_BASE_URL: &'static str = "https://beta.lmfdb.org/api/nf_fields/";

    pub fn new(base_url: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!("dynabase/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| CatalogError::Request {
                url: base_url.to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `?coeffs={c0,...,cn}&_format=json&_fields=label&_delim=;`
    #[must_use]
    pub fn label_query_url(&self, coeffs: &[BigInt]) -> String {
        let list: Vec<String> = coeffs.iter().map(ToString::to_string).collect();

        format!(
            "{}?coeffs={{{}}}&_format=json&_fields=label&_delim=;",
            self.base_url,
            list.join(",")
        )
    }

    /// `?label=...&_format=json&_fields=coeffs&_delim=;`
    #[must_use]
    pub fn field_query_url(&self, label: &Label) -> String {
        format!(
            "{}?label={label}&_format=json&_fields=coeffs&_delim=;",
            self.base_url
        )
    }

    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, CatalogError> {
        let failed = |err: reqwest::Error| {
            if err.is_timeout() {
                CatalogError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis(),
                }
            } else {
                CatalogError::Request {
                    url: url.to_string(),
                    message: err.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(failed)
    }
}

impl LabelResolver for LmfdbCatalog {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn resolve_label(&self, field: &Field, timeout: Duration) -> Result<Option<String>, Error> {
        let url = self.label_query_url(&query_coefficients(field)?);
        let body = self.fetch(&url, timeout)?;

        Ok(parse_label_response(&url, &body)?)
    }

    fn resolve_field(&self, label: &str, timeout: Duration) -> Result<Option<Field>, Error> {
        let label: Label = label.parse()?;
        let url = self.field_query_url(&label);
        let body = self.fetch(&url, timeout)?;

        parse_coeffs_response(&url, &body)?
            .map(field_from_coefficients)
            .transpose()
            .map_err(Error::from)
    }
}

//
// Response parsing
//

#[derive(Deserialize)]
struct Response<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct LabelRow {
    label: String,
}

#[derive(Deserialize)]
struct CoeffsRow {
    coeffs: Vec<Decimal>,
}

fn parse<T: for<'de> Deserialize<'de>>(url: &str, body: &str) -> Result<Vec<T>, CatalogError> {
    serde_json::from_str::<Response<T>>(body)
        .map(|response| response.data)
        .map_err(|err| CatalogError::Malformed {
            url: url.to_string(),
            message: err.to_string(),
        })
}

/// First label in a `_fields=label` response. An empty `data` list is a miss.
pub(crate) fn parse_label_response(url: &str, body: &str) -> Result<Option<String>, CatalogError> {
    Ok(parse::<LabelRow>(url, body)?
        .into_iter()
        .next()
        .map(|row| row.label))
}

/// First coefficient list in a `_fields=coeffs` response.
pub(crate) fn parse_coeffs_response(
    url: &str,
    body: &str,
) -> Result<Option<Vec<BigInt>>, CatalogError> {
    Ok(parse::<CoeffsRow>(url, body)?
        .into_iter()
        .next()
        .map(|row| row.coeffs.into_iter().map(|c| c.0).collect()))
}

///
/// TESTS
///
