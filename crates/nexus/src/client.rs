//! Nexus 3 REST client
//!
//! Wraps a `reqwest::Client` and implements the NexusApi trait from
//! nexus3-core. Every call is a single request without retries.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, Response, StatusCode, multipart};
use tokio::io::AsyncWriteExt;

use nexus3_core::admin::{ScriptInfo, ScriptRun};
use nexus3_core::{
    ApiVersion, AssetDeletion, Config, Error, NexusApi, RepositoryInfo, Result, SearchPage,
};

const USER_AGENT: &str = concat!("nexus3/", env!("CARGO_PKG_VERSION"));

/// REST client for a single Nexus 3 service
#[derive(Debug, Clone)]
pub struct NexusClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    api_version: ApiVersion,
}

impl NexusClient {
    /// Create a client from a configuration
    pub fn new(config: &Config) -> Result<Self> {
        url::Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid Nexus URL '{}': {e}", config.url)))?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.x509_verify)
            .build()
            .map_err(|e| Error::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            api_version: config.api_version,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<url>/service/rest/<version>/<endpoint>`
    fn rest_url(&self, version: ApiVersion, endpoint: &str) -> String {
        format!("{}/service/rest/{version}/{endpoint}", self.base_url)
    }

    /// `<url>/repository/<repository>/<asset path>`, each segment escaped
    fn content_url(&self, repository: &str, asset_path: &str) -> String {
        let escaped: Vec<_> = asset_path.split('/').map(urlencoding::encode).collect();
        format!(
            "{}/repository/{}/{}",
            self.base_url,
            urlencoding::encode(repository),
            escaped.join("/")
        )
    }

    /// `script` or `script/<name>[/<action>]`; scripts only exist in v1
    fn script_url(&self, name: Option<&str>, action: Option<&str>) -> String {
        let mut endpoint = "script".to_string();
        if let Some(name) = name {
            endpoint.push('/');
            endpoint.push_str(&urlencoding::encode(name));
        }
        if let Some(action) = action {
            endpoint.push('/');
            endpoint.push_str(action);
        }
        self.rest_url(ApiVersion::V1, &endpoint)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(%method, url, "Nexus request");
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Send a request, mapping transport failures and 401 responses
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::InvalidCredentials(
                "Try running `nexus3 login`".to_string(),
            ));
        }

        Ok(response)
    }
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

#[async_trait]
impl NexusApi for NexusClient {
    async fn list_repositories(&self) -> Result<Vec<RepositoryInfo>> {
        let url = self.rest_url(ApiVersion::V1, "repositories");
        let response = self.send(self.request(Method::GET, &url)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Api(format!(
                "Listing repositories. Reason: {}",
                reason(status)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("Invalid repository list: {e}")))
    }

    async fn search_assets(
        &self,
        repository: &str,
        keyword: Option<String>,
        continuation_token: Option<String>,
    ) -> Result<SearchPage> {
        let url = self.rest_url(self.api_version, "search/assets");

        let mut query = vec![("repository", repository.to_string())];
        if let Some(keyword) = keyword {
            query.push(("keyword", format!("\"{keyword}\"")));
        }
        if let Some(token) = continuation_token {
            query.push(("continuationToken", token));
        }

        let response = self
            .send(self.request(Method::GET, &url).query(&query))
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Api(format!(
                "Searching {repository}. Reason: {}",
                reason(status)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("Invalid search response: {e}")))
    }

    async fn delete_asset(&self, id: &str) -> Result<AssetDeletion> {
        let endpoint = format!("assets/{}", urlencoding::encode(id));
        let url = self.rest_url(self.api_version, &endpoint);
        let response = self.send(self.request(Method::DELETE, &url)).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(AssetDeletion::Deleted),
            StatusCode::NOT_FOUND => Ok(AssetDeletion::AlreadyGone),
            status => Err(Error::Api(reason(status).to_string())),
        }
    }

    async fn upload_raw(
        &self,
        repository: &str,
        directory: &str,
        filename: &str,
        source: &Path,
    ) -> Result<()> {
        let content = tokio::fs::read(source).await?;
        let mime = mime_guess::from_path(source).first_or_octet_stream();

        let asset = multipart::Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(mime.essence_str())
            .map_err(|e| Error::Api(format!("Invalid content type {mime}: {e}")))?;
        let form = multipart::Form::new()
            .part("raw.asset1", asset)
            .text("raw.directory", directory.to_string())
            .text("raw.asset1.filename", filename.to_string());

        let url = self.rest_url(self.api_version, "components");
        let request = self
            .request(Method::POST, &url)
            .query(&[("repository", repository)])
            .multipart(form);
        let response = self.send(request).await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            return Err(Error::Api(format!(
                "Uploading to {repository}. Reason: {}",
                reason(status)
            )));
        }

        tracing::debug!(repository, directory, filename, "Uploaded");
        Ok(())
    }

    async fn put_asset(&self, repository: &str, asset_path: &str, source: &Path) -> Result<()> {
        let file = tokio::fs::File::open(source).await?;
        let url = self.content_url(repository, asset_path);

        let response = self
            .send(self.request(Method::PUT, &url).body(file))
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Api(format!(
                "Uploading to {url}. Reason: {}",
                reason(status)
            )));
        }

        tracing::debug!(url, "Uploaded");
        Ok(())
    }

    async fn download_asset(&self, url: &str, destination: &Path) -> Result<u64> {
        let response = self.send(self.request(Method::GET, url)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Download(format!(
                "Downloading from {url}. Reason: {}",
                reason(status)
            )));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| Error::Download(format!("Downloading from {url}. Reason: {e}")))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(url, destination = %destination.display(), written, "Wrote download");
        Ok(written)
    }

    async fn script_exists(&self, name: &str) -> Result<bool> {
        let url = self.script_url(Some(name), None);
        let response = self.send(self.request(Method::HEAD, &url)).await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::Api(format!(
                "Looking up script {name}. Reason: {}",
                reason(status)
            ))),
        }
    }

    async fn list_scripts(&self) -> Result<Vec<ScriptInfo>> {
        let url = self.script_url(None, None);
        let response = self.send(self.request(Method::GET, &url)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Api(format!(
                "Listing scripts. Reason: {}",
                reason(status)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("Invalid script list: {e}")))
    }

    async fn create_script(&self, script: &ScriptInfo) -> Result<()> {
        let url = self.script_url(None, None);
        let response = self
            .send(self.request(Method::POST, &url).json(script))
            .await?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Creating script {}. Reason: {} {body}",
                script.name,
                reason(status)
            )));
        }

        tracing::debug!(script = %script.name, "Created script");
        Ok(())
    }

    async fn run_script(&self, name: &str, data: &str) -> Result<ScriptRun> {
        let url = self.script_url(Some(name), Some("run"));
        let request = self
            .request(Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(data.to_string());
        let response = self.send(request).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "Running script {name}. Reason: {} {body}",
                reason(status)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("Invalid response from script {name}: {e}")))
    }

    async fn delete_script(&self, name: &str) -> Result<()> {
        let url = self.script_url(Some(name), None);
        let response = self.send(self.request(Method::DELETE, &url)).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(Error::Api(format!("Script {name} not found"))),
            status => Err(Error::Api(format!(
                "Deleting script {name}. Reason: {}",
                reason(status)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str, api_version: ApiVersion) -> NexusClient {
        NexusClient::new(&Config {
            url: url.to_string(),
            api_version,
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rest_url() {
        let client = client("http://nexus:8081/", ApiVersion::V1);
        assert_eq!(client.base_url(), "http://nexus:8081");
        assert_eq!(
            client.rest_url(ApiVersion::V1, "repositories"),
            "http://nexus:8081/service/rest/v1/repositories"
        );
        assert_eq!(
            client.rest_url(ApiVersion::Beta, "search/assets"),
            "http://nexus:8081/service/rest/beta/search/assets"
        );
    }

    #[test]
    fn test_script_url_always_v1() {
        let client = client("http://nexus:8081", ApiVersion::Beta);
        assert_eq!(
            client.script_url(None, None),
            "http://nexus:8081/service/rest/v1/script"
        );
        assert_eq!(
            client.script_url(Some("my script"), Some("run")),
            "http://nexus:8081/service/rest/v1/script/my%20script/run"
        );
    }

    #[test]
    fn test_content_url_escapes_segments() {
        let client = client("http://nexus:8081", ApiVersion::V1);
        assert_eq!(
            client.content_url("rpms", "el8/my pkg.rpm"),
            "http://nexus:8081/repository/rpms/el8/my%20pkg.rpm"
        );
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = NexusClient::new(&Config {
            url: "not a url".to_string(),
            ..Config::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
