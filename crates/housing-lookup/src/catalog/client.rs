use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::domain::{City, Institution};
use super::router::{CITIES_PATH, INSTITUTIONS_PATH};
use super::store::CatalogKind;
use crate::config::CatalogConfig;
use crate::lookup::{Candidate, CandidateSource, LookupQuery, SourceError};

/// HTTP client for the catalog search endpoints.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, SourceError> {
        Self::new(config.api_url.clone(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn search_cities(&self, text: &str) -> Result<Vec<City>, SourceError> {
        self.get_json(CITIES_PATH, &[("search", text.to_string())])
            .await
    }

    pub async fn search_institutions(
        &self,
        text: &str,
        city_id: &str,
    ) -> Result<Vec<Institution>, SourceError> {
        self.get_json(
            INSTITUTIONS_PATH,
            &[
                ("search", text.to_string()),
                ("city_id", city_id.to_string()),
            ],
        )
        .await
    }

    /// A lookup source bound to one collection.
    pub fn source(&self, kind: CatalogKind) -> HttpCatalogSource {
        HttpCatalogSource {
            client: self.clone(),
            kind,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            reqwest::StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|err| SourceError::Decode(err.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SourceError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(err.to_string())
    }
}

/// [`CandidateSource`] backed by the remote catalog.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: HttpCatalogClient,
    kind: CatalogKind,
}

#[async_trait]
impl CandidateSource for HttpCatalogSource {
    async fn search(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError> {
        match self.kind {
            CatalogKind::City => {
                let cities = self.client.search_cities(&query.text).await?;
                Ok(cities.iter().map(Candidate::from).collect())
            }
            CatalogKind::Institution => {
                let scope = query.scope.as_ref().ok_or(SourceError::MissingScope)?;
                let institutions = self
                    .client
                    .search_institutions(&query.text, scope.as_str())
                    .await?;
                Ok(institutions.iter().map(Candidate::from).collect())
            }
        }
    }
}
