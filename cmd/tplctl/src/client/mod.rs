mod error;

pub use error::ApiError;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

use crate::types::{
    GetProjectTemplateResponse, ProjectTemplate, TemplateRef, UpdateProjectTemplateRequest,
};

/// Remote operations on project templates
#[async_trait]
pub trait TemplateService: Send + Sync {
    async fn get_project_template(
        &self,
        reference: &TemplateRef,
    ) -> Result<ProjectTemplate, ApiError>;

    /// Replace the stored template with `template` (full-record update)
    async fn update_project_template(&self, template: &ProjectTemplate) -> Result<(), ApiError>;
}

pub struct ApiClient {
    base_url: String,
    client: Client,
    username: Option<String>,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            username: None,
            token: None,
        })
    }

    /// Set the username for X-User-ID header
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Set the bearer token for the Authorization header
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Join percent-encoded path segments onto the base URL
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut request = self.client.request(method, url);

        if let Some(username) = &self.username {
            request = request.header("X-User-ID", username);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TemplateService for ApiClient {
    async fn get_project_template(
        &self,
        reference: &TemplateRef,
    ) -> Result<ProjectTemplate, ApiError> {
        let url = match reference {
            TemplateRef::Id(id) => self.url(&["v1", "project-templates", "id", id.as_str()])?,
            TemplateRef::Name(name) => self.url(&["v1", "project-templates", "name", name.as_str()])?,
        };
        debug!(%url, "GET project template");

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        debug!(%status, "project template response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let body: GetProjectTemplateResponse =
            response.json().await.map_err(ApiError::Decode)?;

        // A successful response without a record is treated like a miss
        body.project_template.ok_or(ApiError::NotFound)
    }

    async fn update_project_template(&self, template: &ProjectTemplate) -> Result<(), ApiError> {
        let url = self.url(&["v1", "project-templates"])?;
        debug!(%url, name = %template.name, "PUT project template");

        let response = self
            .request(Method::PUT, url)
            .json(&UpdateProjectTemplateRequest {
                project_template: template,
            })
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        debug!(%status, "update response");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TerraformNocodeModule;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> ApiClient {
        ApiClient::new(uri, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_encodes_segments() {
        let client = client("http://localhost:9702/api/");
        let url = client
            .url(&["v1", "project-templates", "name", "my app/v2"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9702/api/v1/project-templates/name/my%20app%2Fv2"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let client = client("localhost");
        assert!(matches!(
            client.url(&["v1"]),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/project-templates/id/tmpl-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "project_template": {
                    "id": "tmpl-1",
                    "name": "api",
                    "summary": "old",
                    "readme_markdown_template": "IyBSRUFETUU=",
                    "terraform_nocode_module": { "source": "app/aws", "version": "1.0.0" },
                    "tags": ["a"]
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let template = client(&mock_server.uri())
            .get_project_template(&TemplateRef::Id("tmpl-1".to_string()))
            .await
            .unwrap();

        assert_eq!(template.name, "api");
        assert_eq!(template.readme_markdown_template, b"# README");
        assert_eq!(
            template.terraform_nocode_module,
            Some(TerraformNocodeModule {
                source: "app/aws".to_string(),
                version: "1.0.0".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_get_by_name_sends_identity_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/project-templates/name/api"))
            .and(header("X-User-ID", "dev"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "project_template": { "name": "api" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let template = client(&mock_server.uri())
            .with_username(Some("dev".to_string()))
            .with_token(Some("s3cret".to_string()))
            .get_project_template(&TemplateRef::Name("api".to_string()))
            .await
            .unwrap();

        assert_eq!(template.name, "api");
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/project-templates/name/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri())
            .get_project_template(&TemplateRef::Name("missing".to_string()))
            .await;

        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_empty_body_is_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/project-templates/id/ghost"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let result = client(&mock_server.uri())
            .get_project_template(&TemplateRef::Id("ghost".to_string()))
            .await;

        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/project-templates/id/tmpl-1"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "database offline" })),
            )
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .get_project_template(&TemplateRef::Id("tmpl-1".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 500));
        assert_eq!(err.humanize(), "database offline");
    }

    #[tokio::test]
    async fn test_update_puts_full_record() {
        let template = ProjectTemplate {
            id: "tmpl-1".to_string(),
            name: "tmpl-1".to_string(),
            summary: "new".to_string(),
            tags: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        };

        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/project-templates"))
            .and(body_json(json!({
                "project_template": {
                    "id": "tmpl-1",
                    "name": "tmpl-1",
                    "summary": "new",
                    "expanded_summary": "",
                    "readme_markdown_template": "",
                    "tags": ["b", "c"]
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        client(&mock_server.uri())
            .update_project_template(&template)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_humanized() {
        // Nothing listens on the discard port
        let err = client("http://127.0.0.1:9")
            .get_project_template(&TemplateRef::Id("tmpl-1".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(
            err.humanize(),
            "Unable to connect to the server at http://127.0.0.1:9"
        );
    }
}
