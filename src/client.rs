//! Request helper for the M2M JSON API.
//!
//! Every endpoint is a POST with a JSON body. Responses share one envelope,
//! `{errorCode, errorMessage, data}`, and only `data` is handed back to callers.
use crate::error::ApiError;
use crate::model::{
    Credentials, DownloadOption, DownloadOptionsRequest, DownloadProduct, DownloadRequest,
    DownloadRequestResults, DownloadRetrieveRequest, DownloadRetrieveResults, SceneSearchRequest,
    SceneSearchResults, SessionToken,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

pub const SERVICE_URL: &str = "https://m2m.cr.usgs.gov/api/api/json/stable/";

/// The service rejects `download-options` calls listing more entity ids than this.
pub const MAX_ENTITY_IDS_PER_REQUEST: usize = 50_000;

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        // Url::join drops the last path segment unless the base ends with a slash
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&base)?,
        })
    }

    pub fn base_url(self: &Self) -> &Url {
        &self.base_url
    }

    /// POST `payload` to `endpoint` and return the decoded `data` of the envelope.
    ///
    /// Non-2xx statuses, an empty body, an undecodable body and a non-null `errorCode`
    /// are all reported as [`ApiError`]; nothing is retried.
    pub async fn send_request<T, P>(
        self: &Self,
        endpoint: &str,
        payload: Option<&P>,
        token: Option<&SessionToken>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let url = self.base_url.join(endpoint)?;

        let mut request = self.http.post(url);
        if let Some(token) = token {
            request = request.header(AUTH_HEADER, token.as_str());
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(endpoint, %status, "Received response");
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(Envelope {
                error_code: Some(code),
                error_message,
                ..
            }) = serde_json::from_str::<Envelope>(&body)
            {
                warn!(
                    endpoint,
                    "{} - {}",
                    code,
                    error_message.unwrap_or_default()
                );
            }
            return Err(ApiError::from_status(status.as_u16()));
        }

        if body.trim().is_empty() {
            return Err(ApiError::EmptyResponse);
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        if let Some(code) = envelope.error_code {
            return Err(ApiError::Service {
                code,
                message: envelope.error_message.unwrap_or_default(),
            });
        }

        Ok(serde_json::from_value(envelope.data)?)
    }

    pub async fn login(self: &Self, credentials: &Credentials) -> Result<SessionToken, ApiError> {
        self.send_request("login", Some(credentials), None).await
    }

    pub async fn scene_search(
        self: &Self,
        token: &SessionToken,
        request: &SceneSearchRequest<'_>,
    ) -> Result<SceneSearchResults, ApiError> {
        self.send_request("scene-search", Some(request), Some(token))
            .await
    }

    /// Download options for every entity id, split into calls of at most
    /// [`MAX_ENTITY_IDS_PER_REQUEST`] ids.
    pub async fn download_options(
        self: &Self,
        token: &SessionToken,
        dataset_name: &str,
        entity_ids: &[String],
    ) -> Result<Vec<DownloadOption>, ApiError> {
        let mut options = vec![];
        for chunk in entity_ids.chunks(MAX_ENTITY_IDS_PER_REQUEST) {
            let payload = DownloadOptionsRequest {
                dataset_name,
                entity_ids: chunk,
            };
            let batch: Option<Vec<DownloadOption>> = self
                .send_request("download-options", Some(&payload), Some(token))
                .await?;
            options.extend(batch.unwrap_or_default());
        }
        Ok(options)
    }

    pub async fn download_request(
        self: &Self,
        token: &SessionToken,
        downloads: &[DownloadProduct],
        label: &str,
    ) -> Result<DownloadRequestResults, ApiError> {
        let payload = DownloadRequest { downloads, label };
        self.send_request("download-request", Some(&payload), Some(token))
            .await
    }

    pub async fn download_retrieve(
        self: &Self,
        token: &SessionToken,
        label: &str,
    ) -> Result<DownloadRetrieveResults, ApiError> {
        let payload = DownloadRetrieveRequest { label };
        self.send_request("download-retrieve", Some(&payload), Some(token))
            .await
    }

    /// Invalidate the session. `Ok(false)` means the service answered but returned data,
    /// which it only does when the logout did not take effect.
    pub async fn logout(self: &Self, token: SessionToken) -> Result<bool, ApiError> {
        let data: Option<serde_json::Value> = self
            .send_request::<_, ()>("logout", None, Some(&token))
            .await?;
        Ok(data.is_none())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(SERVICE_URL).expect("Service URL should always parse")
    }
}
