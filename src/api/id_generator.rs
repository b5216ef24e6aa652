//! Server-side identifier allocation via `GET /system/id.json`

use anyhow::{anyhow, Result};
use std::sync::Arc;

use super::client::RestApiActions;
use super::http::Transport;
use super::query_params::QueryParams;
use crate::config::ClientConfig;
use crate::response::PathQuery;

pub struct IdGenerator {
    rest: RestApiActions,
}

impl IdGenerator {
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self {
            rest: RestApiActions::new(transport, config, "/system"),
        }
    }

    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.rest = self.rest.with_base_uri(base_uri);
        self
    }

    /// Allocate one unique identifier
    pub fn generate_unique_id(&self) -> Result<String> {
        self.generate_unique_ids(1)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Server returned no identifiers"))
    }

    /// Allocate `limit` unique identifiers
    pub fn generate_unique_ids(&self, limit: usize) -> Result<Vec<String>> {
        let params = QueryParams::new().add("limit", limit.to_string());
        let response = self.rest.get("id.json", Some(&params))?;
        response.validate().status_code(200)?.body_not_null("codes")?;

        let codes = response.extract_strings("codes");
        if codes.len() < limit {
            return Err(anyhow!(
                "Requested {} identifiers but the server returned {}",
                limit,
                codes.len()
            ));
        }
        Ok(codes)
    }
}
