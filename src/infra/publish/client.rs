use std::{path::Path, time::Duration};

use newsdesk_api_types::ArticleMetadata;
use reqwest::{
    Client, Method, Url,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    error::PublishError,
    multipart,
    response::parse_response,
    signing::{self, Credentials, SignedBody},
};

pub const DEFAULT_GET_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Signed client for the publishing API.
#[derive(Clone, Debug)]
pub struct PublishClient {
    client: Client,
    base: Url,
    credentials: Credentials,
    get_timeout: Duration,
    upload_timeout: Duration,
}

impl PublishClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, PublishError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            client,
            base,
            credentials,
            get_timeout: DEFAULT_GET_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        })
    }

    /// Timeouts for body-less calls and for uploads.
    pub fn with_timeouts(mut self, get: Duration, upload: Duration) -> Self {
        self.get_timeout = get;
        self.upload_timeout = upload;
        self
    }

    pub fn user_agent() -> &'static str {
        concat!("newsdesk/", env!("CARGO_PKG_VERSION"))
    }

    /// Endpoint relative to the API base.
    pub fn url(&self, path: &str) -> Result<Url, PublishError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    pub async fn get(&self, url: &Url) -> Result<Value, PublishError> {
        let (status, body) = self.send(Method::GET, url, None).await?;
        parse_response(status, &body)?.ok_or(PublishError::UnexpectedResponse {
            status,
            body: String::new(),
        })
    }

    /// `None` when the API answers with no content.
    pub async fn delete(&self, url: &Url) -> Result<Option<Value>, PublishError> {
        let (status, body) = self.send(Method::DELETE, url, None).await?;
        parse_response(status, &body)
    }

    /// Upload an article document with its bundle files.
    pub async fn post(
        &self,
        url: &Url,
        json: &str,
        bundles: &[impl AsRef<Path>],
        metadata: Option<&ArticleMetadata>,
    ) -> Result<Value, PublishError> {
        let body = multipart::article_body(json, bundles, metadata).await?;
        let (status, response) = self.send(Method::POST, url, Some(body)).await?;
        parse_response(status, &response)?.ok_or(PublishError::UnexpectedResponse {
            status,
            body: String::new(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, PublishError> {
        let value = self.get(url).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<multipart::MultipartBody>,
    ) -> Result<(u16, bytes::Bytes), PublishError> {
        let mut request = self.client.request(method.clone(), url.clone());
        let authorization = match body {
            Some(body) => {
                let content_type = body.content_type();
                let encoded = body.encode();
                let date = signing::current_date()?;
                let header = signing::authorization(
                    &self.credentials,
                    method.as_str(),
                    url.as_str(),
                    &date,
                    Some(SignedBody {
                        content_type: &content_type,
                        bytes: &encoded,
                    }),
                )?;
                request = request
                    .timeout(self.upload_timeout)
                    .header(CONTENT_TYPE, content_type)
                    .body(encoded);
                header
            }
            None => {
                let date = signing::current_date()?;
                request = request.timeout(self.get_timeout);
                signing::authorization(
                    &self.credentials,
                    method.as_str(),
                    url.as_str(),
                    &date,
                    None,
                )?
            }
        };

        let response = request
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .inspect_err(|err| {
                warn!(
                    target = "infra::publish",
                    method = %method,
                    url = %url,
                    error = %err,
                    "request failed"
                );
            })?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        debug!(
            target = "infra::publish",
            method = %method,
            url = %url,
            status,
            bytes = bytes.len(),
            "response received"
        );
        Ok((status, bytes))
    }
}
