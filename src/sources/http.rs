use crate::sources::error::SourceError;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// GETs `url` and decodes the JSON body, classifying failures the way the orchestrator
/// expects: transport and status errors as unavailable, bad payloads as format errors.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
) -> Result<T, SourceError> {
    debug!("Requesting {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::from_status(url.to_string(), e))?;

    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(e) => {
            warn!("HTTP error for {}: {:?}", url, e.status());
            return Err(SourceError::from_status(url.to_string(), e));
        }
    };

    let body = response
        .text()
        .await
        .map_err(|e| SourceError::from_status(url.to_string(), e))?;
    serde_json::from_str(&body).map_err(|e| SourceError::JsonParse {
        url: url.to_string(),
        source: e,
    })
}
