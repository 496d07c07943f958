//! Domain registrar API integration
//!
//! Custom domains are attached to the hosting project through the
//! registrar's REST API. Every call is authenticated with a bearer token and
//! optionally scoped to a team. Failures are logged here and surfaced as a
//! single [`RegistrarError`] per operation, so callers never see
//! provider-specific error bodies.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use tenantsite_shared::hostname::{is_reserved, is_valid_domain, normalize_domain};

/// Default registrar API endpoint
pub const DEFAULT_REGISTRAR_API_URL: &str = "https://api.vercel.com";

/// Connection settings for the registrar API
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    pub api_url: String,
    pub api_token: String,
    pub project_id: String,
    pub team_id: Option<String>,
}

/// DNS challenge the tenant must publish to prove ownership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationChallenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub domain: String,
    pub value: String,
    pub reason: String,
}

/// Project domain as reported by the registrar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarDomainInfo {
    pub name: String,
    pub apex_name: String,
    pub project_id: String,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub redirect_status_code: Option<u16>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub verified: bool,
    #[serde(default)]
    pub verification: Vec<VerificationChallenge>,
}

/// DNS configuration status of a domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrarDomainConfig {
    #[serde(default)]
    pub accepted_challenges: Vec<String>,
    #[serde(default)]
    pub configured_by: Option<String>,
    pub misconfigured: bool,
}

impl RegistrarDomainConfig {
    /// DNS points at the hosting infrastructure
    pub fn configured(&self) -> bool {
        !self.misconfigured
    }
}

#[derive(Debug, Serialize)]
struct AddDomainRequest<'a> {
    name: &'a str,
}

/// Registrar operation, used for logging and the uniform failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Verify,
    GetConfiguration,
    Remove,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add_domain",
            Self::Verify => "verify_domain",
            Self::GetConfiguration => "get_domain_configuration",
            Self::Remove => "remove_domain",
        }
    }

    /// Human-readable message shown to API callers
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Add => "Failed to add domain",
            Self::Verify => "Failed to verify domain",
            Self::GetConfiguration => "Failed to get domain configuration",
            Self::Remove => "Failed to remove domain",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("{domain} is reserved and cannot be used as a custom domain")]
    ReservedDomain { domain: String, operation: Operation },

    #[error("Invalid domain: {domain}")]
    InvalidDomain { domain: String, operation: Operation },

    /// Any non-2xx status, network fault or undecodable body
    #[error("{}", .0.failure_message())]
    Upstream(Operation),
}

impl RegistrarError {
    pub fn operation(&self) -> Operation {
        match self {
            Self::ReservedDomain { operation, .. } | Self::InvalidDomain { operation, .. } => {
                *operation
            }
            Self::Upstream(operation) => *operation,
        }
    }

    /// Rejected locally, before any request was sent
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Upstream(_))
    }
}

/// Client for the registrar's project-domain API
#[derive(Clone)]
pub struct RegistrarClient {
    client: Client,
    config: RegistrarConfig,
    reserved_host: String,
}

impl RegistrarClient {
    /// `reserved_host` is the platform's own app host, which may never be
    /// added to or removed from the project as a tenant domain.
    pub fn new(config: RegistrarConfig, reserved_host: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            reserved_host: reserved_host.into(),
        }
    }

    /// Attach a domain to the project
    pub async fn add_domain(&self, domain: &str) -> Result<RegistrarDomainInfo, RegistrarError> {
        let domain = self.checked(domain, Operation::Add, true)?;
        let path = format!("/v9/projects/{}/domains", self.config.project_id);

        let info: RegistrarDomainInfo = self
            .send_json(
                Operation::Add,
                &domain,
                self.request(Method::POST, &path)
                    .json(&AddDomainRequest { name: &domain }),
            )
            .await?;

        info!(domain = %domain, verified = info.verified, "Domain added to registrar project");
        Ok(info)
    }

    /// Ask the registrar to re-check the domain's verification challenges
    pub async fn verify_domain(&self, domain: &str) -> Result<RegistrarDomainInfo, RegistrarError> {
        let domain = self.checked(domain, Operation::Verify, false)?;
        let path = format!(
            "/v9/projects/{}/domains/{}/verify",
            self.config.project_id, domain
        );

        let info: RegistrarDomainInfo = self
            .send_json(Operation::Verify, &domain, self.request(Method::POST, &path))
            .await?;

        info!(domain = %domain, verified = info.verified, "Registrar verification checked");
        Ok(info)
    }

    /// Fetch DNS configuration and project-domain info concurrently.
    /// Fails if either lookup fails.
    pub async fn get_domain_configuration(
        &self,
        domain: &str,
    ) -> Result<(RegistrarDomainConfig, RegistrarDomainInfo), RegistrarError> {
        let domain = self.checked(domain, Operation::GetConfiguration, false)?;
        let config_path = format!("/v6/domains/{}/config", domain);
        let info_path = format!(
            "/v9/projects/{}/domains/{}",
            self.config.project_id, domain
        );

        tokio::try_join!(
            self.send_json::<RegistrarDomainConfig>(
                Operation::GetConfiguration,
                &domain,
                self.request(Method::GET, &config_path),
            ),
            self.send_json::<RegistrarDomainInfo>(
                Operation::GetConfiguration,
                &domain,
                self.request(Method::GET, &info_path),
            ),
        )
    }

    /// Detach a domain from the project
    pub async fn remove_domain(&self, domain: &str) -> Result<(), RegistrarError> {
        let domain = self.checked(domain, Operation::Remove, true)?;
        let path = format!(
            "/v9/projects/{}/domains/{}",
            self.config.project_id, domain
        );

        let response = self
            .dispatch(Operation::Remove, &domain, self.request(Method::DELETE, &path))
            .await?;

        // Already detached counts as removed
        if response.status() == StatusCode::NOT_FOUND {
            info!(domain = %domain, "Domain was not attached to registrar project");
            return Ok(());
        }

        self.check_status(Operation::Remove, &domain, response).await?;
        info!(domain = %domain, "Domain removed from registrar project");
        Ok(())
    }

    /// Normalize and validate a domain before it is put into a request path
    fn checked(
        &self,
        domain: &str,
        operation: Operation,
        reject_reserved: bool,
    ) -> Result<String, RegistrarError> {
        let normalized = normalize_domain(domain);

        if reject_reserved && is_reserved(&normalized, &self.reserved_host) {
            warn!(domain = %normalized, operation = operation.as_str(), "Rejected reserved domain");
            return Err(RegistrarError::ReservedDomain {
                domain: normalized,
                operation,
            });
        }

        if !is_valid_domain(&normalized) {
            warn!(domain = %domain, operation = operation.as_str(), "Rejected malformed domain");
            return Err(RegistrarError::InvalidDomain {
                domain: domain.to_string(),
                operation,
            });
        }

        Ok(normalized)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);
        let request = self
            .client
            .request(method, url)
            .bearer_auth(&self.config.api_token)
            .header("Content-Type", "application/json");

        match &self.config.team_id {
            Some(team_id) => request.query(&[("teamId", team_id)]),
            None => request,
        }
    }

    async fn dispatch(
        &self,
        operation: Operation,
        domain: &str,
        request: RequestBuilder,
    ) -> Result<Response, RegistrarError> {
        request.send().await.map_err(|e| {
            error!(
                operation = operation.as_str(),
                domain = %domain,
                error = %e,
                "Failed to call registrar API"
            );
            RegistrarError::Upstream(operation)
        })
    }

    async fn send(
        &self,
        operation: Operation,
        domain: &str,
        request: RequestBuilder,
    ) -> Result<Response, RegistrarError> {
        let response = self.dispatch(operation, domain, request).await?;
        self.check_status(operation, domain, response).await
    }

    async fn check_status(
        &self,
        operation: Operation,
        domain: &str,
        response: Response,
    ) -> Result<Response, RegistrarError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                operation = operation.as_str(),
                domain = %domain,
                status = status.as_u16(),
                body = %body,
                "Registrar API returned error status"
            );
            return Err(RegistrarError::Upstream(operation));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        domain: &str,
        request: RequestBuilder,
    ) -> Result<T, RegistrarError> {
        let response = self.send(operation, domain, request).await?;

        response.json::<T>().await.map_err(|e| {
            error!(
                operation = operation.as_str(),
                domain = %domain,
                error = %e,
                "Failed to parse registrar response"
            );
            RegistrarError::Upstream(operation)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    pub(crate) const PROJECT: &str = "prj_123";
    pub(crate) const TOKEN: &str = "registrar-token";
    pub(crate) const RESERVED: &str = "app.platform.com";

    pub(crate) fn client_for(server: &ServerGuard, team_id: Option<&str>) -> RegistrarClient {
        RegistrarClient::new(
            RegistrarConfig {
                api_url: server.url(),
                api_token: TOKEN.to_string(),
                project_id: PROJECT.to_string(),
                team_id: team_id.map(str::to_string),
            },
            RESERVED,
        )
    }

    pub(crate) fn info_json(name: &str, verified: bool) -> serde_json::Value {
        let verification = if verified {
            json!([])
        } else {
            json!([{
                "type": "TXT",
                "domain": format!("_vercel.{name}"),
                "value": "vc-domain-verify=abc",
                "reason": "pending_domain_verification"
            }])
        };
        json!({
            "name": name,
            "apexName": name,
            "projectId": PROJECT,
            "redirect": null,
            "redirectStatusCode": null,
            "gitBranch": null,
            "updatedAt": 1700000000000i64,
            "createdAt": 1700000000000i64,
            "verified": verified,
            "verification": verification
        })
    }

    #[tokio::test]
    async fn test_add_domain_posts_name_with_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v9/projects/prj_123/domains")
            .match_header("authorization", "Bearer registrar-token")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "name": "example.com" })))
            .with_status(201)
            .with_body(info_json("example.com", false).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let info = client.add_domain("Example.com").await.unwrap();

        assert_eq!(info.name, "example.com");
        assert!(!info.verified);
        assert_eq!(info.verification.len(), 1);
        assert_eq!(info.verification[0].kind, "TXT");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reserved_domain_never_reaches_registrar() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let any_delete = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server, None);

        for name in ["app.platform.com", "APP.PLATFORM.COM", "app.platform.com."] {
            let add = client.add_domain(name).await.unwrap_err();
            assert!(matches!(add, RegistrarError::ReservedDomain { .. }));
            assert!(add.is_validation());

            let remove = client.remove_domain(name).await.unwrap_err();
            assert!(matches!(remove, RegistrarError::ReservedDomain { .. }));
            assert_eq!(remove.operation(), Operation::Remove);
        }

        any.assert_async().await;
        any_delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_domain_rejected_locally() {
        let mut server = Server::new_async().await;
        let any = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.verify_domain("../../v2/user").await.unwrap_err();
        assert!(matches!(err, RegistrarError::InvalidDomain { .. }));
        any.assert_async().await;
    }

    #[tokio::test]
    async fn test_team_id_scopes_requests() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v9/projects/prj_123/domains/example.com")
            .match_query(Matcher::UrlEncoded("teamId".into(), "team_42".into()))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, Some("team_42"));
        client.remove_domain("example.com").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_becomes_uniform_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v9/projects/prj_123/domains/example.com/verify")
            .with_status(400)
            .with_body(r#"{"error":{"code":"missing_txt_record","message":"TXT record missing"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.verify_domain("example.com").await.unwrap_err();

        assert!(matches!(err, RegistrarError::Upstream(Operation::Verify)));
        assert_eq!(err.to_string(), "Failed to verify domain");
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_fast() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v9/projects/prj_123/domains")
            .with_status(200)
            .with_body(r#"{"name":"example.com"}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.add_domain("example.com").await.unwrap_err();
        assert!(matches!(err, RegistrarError::Upstream(Operation::Add)));
    }

    #[tokio::test]
    async fn test_get_domain_configuration_fetches_both() {
        let mut server = Server::new_async().await;
        let config = server
            .mock("GET", "/v6/domains/example.com/config")
            .with_status(200)
            .with_body(
                json!({
                    "acceptedChallenges": ["dns-01", "http-01"],
                    "configuredBy": "CNAME",
                    "misconfigured": false
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let info = server
            .mock("GET", "/v9/projects/prj_123/domains/example.com")
            .with_status(200)
            .with_body(info_json("example.com", true).to_string())
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let (cfg, inf) = client.get_domain_configuration("example.com").await.unwrap();

        assert!(cfg.configured());
        assert_eq!(cfg.configured_by.as_deref(), Some("CNAME"));
        assert_eq!(cfg.accepted_challenges, vec!["dns-01", "http-01"]);
        assert!(inf.verified);
        config.assert_async().await;
        info.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_domain_configuration_fails_if_either_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v6/domains/example.com/config")
            .with_status(200)
            .with_body(r#"{"acceptedChallenges":[],"configuredBy":null,"misconfigured":true}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/v9/projects/prj_123/domains/example.com")
            .with_status(404)
            .with_body(r#"{"error":{"code":"not_found"}}"#)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client
            .get_domain_configuration("example.com")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to get domain configuration");
    }

    #[tokio::test]
    async fn test_remove_of_detached_domain_succeeds() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v9/projects/prj_123/domains/example.com")
            .with_status(404)
            .with_body(r#"{"error":{"code":"not_found","message":"Domain not found"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, None);
        client.remove_domain("example.com").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_error_status_still_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/v9/projects/prj_123/domains/example.com")
            .with_status(503)
            .create_async()
            .await;

        let client = client_for(&server, None);
        let err = client.remove_domain("example.com").await.unwrap_err();
        assert!(matches!(err, RegistrarError::Upstream(Operation::Remove)));
    }

    #[tokio::test]
    async fn test_network_failure_becomes_uniform_error() {
        let client = RegistrarClient::new(
            RegistrarConfig {
                // Nothing listens on the discard port
                api_url: "http://127.0.0.1:9".to_string(),
                api_token: TOKEN.to_string(),
                project_id: PROJECT.to_string(),
                team_id: None,
            },
            RESERVED,
        );

        let err = client.remove_domain("example.com").await.unwrap_err();
        assert!(matches!(err, RegistrarError::Upstream(Operation::Remove)));
    }
}
