//! reqwest-backed Artifactory client
//!
//! One `ArtifactoryClient` (and one connection pool) serves every call of a
//! plugin invocation. Batch operations issue one request per matched item;
//! a 401 on any item aborts the batch, other per-item failures are counted.

use std::time::Duration;

use arty_core::types::{PluginConfig, RetryPolicy};
use async_trait::async_trait;
use camino::Utf8Path;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Identity, Method, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::aql::{self, Pattern};
use crate::error::{ArtifactoryError, Result};
use crate::paths::{copy_destination, expand_local, upload_destination};
use crate::traits::{
    CopyService, DeleteService, DockerService, PropertyService, SearchService, UploadService,
};
use crate::transport::Transport;
use crate::types::{
    CopyParams, DeleteParams, ImagePromotion, ResultItem, ResultSet, SearchParams,
    TransferSummary, UploadParams,
};

/// Per-request timeout
const HTTP_TIMEOUT_SECS: u64 = 300;

fn user_agent() -> String {
    format!(
        "arty/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Authentication method, in precedence order
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Access token sent as `Authorization: Bearer`
    Token(String),
    /// API key sent as `X-JFrog-Art-Api`
    ApiKey(String),
    Basic {
        username: String,
        password: String,
    },
    Anonymous,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Token(_) => write!(f, "Token(***)"),
            Auth::ApiKey(_) => write!(f, "ApiKey(***)"),
            Auth::Basic { username, .. } => write!(f, "Basic({}, ***)", username),
            Auth::Anonymous => write!(f, "Anonymous"),
        }
    }
}

impl Auth {
    /// Pick the strongest credential present: token, then API key, then
    /// username and password
    pub fn from_config(config: &PluginConfig) -> Self {
        if let Some(token) = config.token() {
            Auth::Token(token.to_string())
        } else if let Some(api_key) = config.api_key() {
            Auth::ApiKey(api_key.to_string())
        } else if let (Some(username), Some(password)) = (config.username(), config.password()) {
            Auth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }
        } else {
            Auth::Anonymous
        }
    }

    fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::ApiKey(key) => builder.header("X-JFrog-Art-Api", key),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Anonymous => builder,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AqlResponse {
    #[serde(default)]
    results: Vec<ResultItem>,
}

/// Per-item outcome accounting for batch operations
#[derive(Debug, Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
    last_error: Option<ArtifactoryError>,
}

impl Tally {
    /// Count one item; a 401 aborts the whole batch, keeping the number of
    /// items already done
    fn record(&mut self, subject: &str, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => self.succeeded += 1,
            Err(err) if err.is_unauthorized() && self.succeeded > 0 => {
                return Err(ArtifactoryError::Interrupted {
                    succeeded: self.succeeded,
                    source: Box::new(err),
                })
            }
            Err(err) if err.is_unauthorized() => return Err(err),
            Err(err) => {
                warn!(subject = %subject, error = %err, "item failed");
                self.failed += 1;
                self.last_error = Some(err);
            }
        }
        Ok(())
    }

    /// Nothing succeeded: surface the last error so it is classified by
    /// status. Otherwise report the counts.
    fn into_summary(self) -> Result<TransferSummary> {
        match self.last_error {
            Some(err) if self.succeeded == 0 => Err(err),
            _ => Ok(TransferSummary::new(self.succeeded, self.failed)),
        }
    }

    fn into_count(self) -> Result<usize> {
        let summary = self.into_summary()?;
        if summary.failed > 0 {
            return Err(ArtifactoryError::PartialFailure {
                succeeded: summary.succeeded,
                failed: summary.failed,
            });
        }
        Ok(summary.succeeded)
    }
}

/// Artifactory REST client
#[derive(Debug, Clone)]
pub struct ArtifactoryClient {
    base_url: Url,
    auth: Auth,
    transport: Transport,
    dry_run: bool,
}

impl ArtifactoryClient {
    /// Build a client from plugin configuration: TLS identity, insecure
    /// flag, credentials, and the transport retry policy
    pub fn new(config: &PluginConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS));

        if config.insecure_tls {
            warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let (Some(cert), Some(key)) = (&config.client_cert_path, &config.client_cert_key_path) {
            builder = builder.identity(load_identity(cert, key)?);
        }

        let client = builder
            .build()
            .map_err(|e| ArtifactoryError::Tls(e.to_string()))?;

        let transport = Transport::new(
            client,
            RetryPolicy::for_transport(config.retry_budget(), config.http_client_retry_wait_ms),
        );

        Self::with_transport(&config.url, Auth::from_config(config), transport, config.dry_run)
    }

    /// Build a client around an existing transport
    pub fn with_transport(
        base_url: &str,
        auth: Auth,
        transport: Transport,
        dry_run: bool,
    ) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if base_url.cannot_be_a_base() {
            return Err(ArtifactoryError::InvalidUrl(base));
        }

        Ok(Self {
            base_url,
            auth,
            transport,
            dry_run,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Resolve `path` below the base URL, percent-encoding each segment
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ArtifactoryError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
            if path.ends_with('/') {
                segments.push("");
            }
        }
        Ok(url)
    }

    async fn request(
        &self,
        operation: &str,
        method: Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<reqwest::Response> {
        debug!(operation, method = %method, url = %url, "sending request");
        self.transport
            .send(operation, |client| {
                let builder = self.auth.apply(client.request(method.clone(), url.clone()));
                match body {
                    Some(bytes) => builder.body(bytes.to_vec()),
                    None => builder,
                }
            })
            .await
    }

    async fn copy_item(&self, item: &ResultItem, destination: &str) -> Result<()> {
        let mut url = self.endpoint(&format!("api/copy/{}", item.full_path()))?;
        url.query_pairs_mut()
            .append_pair("to", &format!("/{}", destination.trim_start_matches('/')));
        self.request("copy", Method::POST, &url, None).await?;
        Ok(())
    }

    async fn delete_item(&self, item: &ResultItem) -> Result<()> {
        let url = self.endpoint(&item.full_path())?;
        match self.request("delete", Method::DELETE, &url, None).await {
            Err(err) if err.is_not_found() => {
                debug!(path = %item.full_path(), "already deleted");
                Ok(())
            }
            other => other.map(drop),
        }
    }

    async fn set_item_properties(
        &self,
        item: &ResultItem,
        properties: &str,
        recursive: bool,
    ) -> Result<()> {
        let mut url = self.endpoint(&format!("api/storage/{}", item.full_path()))?;
        url.query_pairs_mut()
            .append_pair("properties", properties)
            .append_pair("recursive", if recursive { "1" } else { "0" });
        self.request("set-properties", Method::PUT, &url, None).await?;
        Ok(())
    }

    async fn upload_file(
        &self,
        source: &Utf8Path,
        destination: &str,
        is_dir: bool,
        build_props: Option<&str>,
    ) -> Result<()> {
        let mut url = self.endpoint(destination)?;
        if let Some(props) = build_props.map(|p| p.trim_start_matches(';')).filter(|p| !p.is_empty()) {
            let path = format!("{};{}", url.path(), props);
            url.set_path(&path);
        }

        let data = if is_dir {
            Vec::new()
        } else {
            tokio::fs::read(source).await?
        };
        debug!(source = %source, destination, bytes = data.len(), "uploading");
        self.request("upload", Method::PUT, &url, Some(&data)).await?;
        Ok(())
    }
}

/// Read a PEM certificate and key into one client identity
fn load_identity(cert: &Utf8Path, key: &Utf8Path) -> Result<Identity> {
    let mut pem = std::fs::read(cert)
        .map_err(|e| ArtifactoryError::Tls(format!("reading client certificate {}: {}", cert, e)))?;
    pem.push(b'\n');
    pem.extend(
        std::fs::read(key)
            .map_err(|e| ArtifactoryError::Tls(format!("reading client key {}: {}", key, e)))?,
    );
    Identity::from_pem(&pem).map_err(|e| ArtifactoryError::Tls(e.to_string()))
}

#[async_trait]
impl SearchService for ArtifactoryClient {
    async fn search(&self, params: &SearchParams) -> Result<ResultSet> {
        let query = aql::build_query(&params.pattern, params.recursive, params.include_dirs)?;
        debug!(pattern = %params.pattern, query = %query, "searching");

        let url = self.endpoint("api/search/aql")?;
        let response = self
            .transport
            .send("search", |client| {
                self.auth
                    .apply(client.post(url.clone()))
                    .header(CONTENT_TYPE, "text/plain")
                    .body(query.clone())
            })
            .await?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(ResultSet::empty());
        }
        let parsed: AqlResponse = serde_json::from_str(&body)?;
        debug!(pattern = %params.pattern, matches = parsed.results.len(), "search complete");
        Ok(ResultSet::new(parsed.results))
    }
}

#[async_trait]
impl CopyService for ArtifactoryClient {
    async fn copy(&self, params: &CopyParams) -> Result<TransferSummary> {
        let pattern = Pattern::parse(&params.pattern)?;
        let items = self
            .search(&SearchParams::new(&params.pattern).recursive(params.recursive))
            .await?;

        let mut tally = Tally::default();
        for item in &items {
            let destination = copy_destination(&pattern, item, &params.target, params.flat);
            if self.dry_run {
                info!(from = %item.full_path(), to = %destination, "dry run: skipping copy");
                tally.record(&item.full_path(), Ok(()))?;
                continue;
            }
            let outcome = self.copy_item(item, &destination).await;
            tally.record(&item.full_path(), outcome)?;
        }
        tally.into_summary()
    }
}

#[async_trait]
impl DeleteService for ArtifactoryClient {
    async fn get_paths_to_delete(&self, params: &DeleteParams) -> Result<ResultSet> {
        self.search(&SearchParams::new(&params.pattern).recursive(params.recursive))
            .await
    }

    async fn delete_files(&self, items: &ResultSet) -> Result<usize> {
        let mut tally = Tally::default();
        for item in items {
            if self.dry_run {
                info!(path = %item.full_path(), "dry run: skipping delete");
                tally.record(&item.full_path(), Ok(()))?;
                continue;
            }
            let outcome = self.delete_item(item).await;
            tally.record(&item.full_path(), outcome)?;
        }
        tally.into_count()
    }
}

#[async_trait]
impl UploadService for ArtifactoryClient {
    async fn upload_files(&self, params: &UploadParams) -> Result<TransferSummary> {
        let matches = expand_local(
            &params.pattern,
            params.recursive,
            params.regexp,
            params.include_dirs,
        )?;
        if matches.sources.is_empty() {
            warn!(pattern = %params.pattern, "no local files matched");
            return Ok(TransferSummary::default());
        }

        let mut tally = Tally::default();
        for source in &matches.sources {
            let mut destination =
                upload_destination(&matches.base, &source.path, &params.target, params.flat);
            if source.is_dir && !destination.ends_with('/') {
                destination.push('/');
            }
            if self.dry_run {
                info!(source = %source.path, to = %destination, "dry run: skipping upload");
                tally.record(source.path.as_str(), Ok(()))?;
                continue;
            }
            let outcome = self
                .upload_file(
                    &source.path,
                    &destination,
                    source.is_dir,
                    params.build_props.as_deref(),
                )
                .await;
            tally.record(source.path.as_str(), outcome)?;
        }
        tally.into_summary()
    }
}

#[async_trait]
impl PropertyService for ArtifactoryClient {
    async fn set_properties(
        &self,
        items: &ResultSet,
        properties: &str,
        recursive: bool,
    ) -> Result<usize> {
        let mut tally = Tally::default();
        for item in items {
            if self.dry_run {
                info!(path = %item.full_path(), properties, "dry run: skipping set properties");
                tally.record(&item.full_path(), Ok(()))?;
                continue;
            }
            let outcome = self.set_item_properties(item, properties, recursive).await;
            tally.record(&item.full_path(), outcome)?;
        }
        tally.into_count()
    }
}

#[async_trait]
impl DockerService for ArtifactoryClient {
    async fn promote_docker_image(&self, promotion: &ImagePromotion) -> Result<()> {
        if self.dry_run {
            info!(
                image = %promotion.docker_repository,
                tag = %promotion.tag,
                target_tag = %promotion.target_tag,
                "dry run: skipping docker promotion"
            );
            return Ok(());
        }

        let url = self.endpoint(&format!("api/docker/{}/v2/promote", promotion.source_repo))?;
        let body = serde_json::to_vec(promotion)?;
        self.transport
            .send("docker-promote", |client| {
                self.auth
                    .apply(client.post(url.clone()))
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone())
            })
            .await?;
        Ok(())
    }
}
