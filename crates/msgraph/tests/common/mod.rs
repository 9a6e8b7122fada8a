//! Shared mock identity provider and Graph host for integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use msgraph::{ClientCertificate, GraphClient, GraphConfig, Token};
use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TENANT: &str = "contoso.onmicrosoft.com";
pub const CLIENT_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const THUMBPRINT: &str = "2A88AF8138C4640B3845C973E21B9FE7CEECD1C3";

pub const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/test_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_key.pub.pem");

/// One mock server playing both the authority and the resource host.
pub struct MockGraph {
    pub server: MockServer,
}

impl MockGraph {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn token_path(&self) -> String {
        format!("/{}/oauth2/token", TENANT)
    }

    pub fn config(&self) -> GraphConfig {
        GraphConfig::new(TENANT, CLIENT_ID)
            .with_authority_host(&self.uri())
            .with_resource_uri(&self.uri())
            .with_timeout_sec(5)
    }

    pub fn certificate(&self) -> ClientCertificate {
        ClientCertificate::new(PRIVATE_KEY_PEM, THUMBPRINT).expect("fixture thumbprint")
    }

    /// Client holding a long-lived token, no refresher.
    pub fn client(&self) -> GraphClient {
        let token = Token::from_access_token("integration-token")
            .with_expires_on(Utc::now() + Duration::hours(1));
        GraphClient::new(self.config(), token).expect("client")
    }

    /// Token endpoint answers with a v1-style token response.
    pub async fn mock_token_success(&self, access_token: &str) {
        let expires_on = (Utc::now() + Duration::hours(1)).timestamp();
        Mock::given(method("POST"))
            .and(path(self.token_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "expires_on": expires_on.to_string(),
                "resource": self.uri(),
                "access_token": access_token,
            })))
            .mount(&self.server)
            .await;
    }

    /// Token endpoint rejects the exchange.
    pub async fn mock_token_error(&self, status: u16, error: &str, description: &str) {
        Mock::given(method("POST"))
            .and(path(self.token_path()))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": error,
                "error_description": description,
            })))
            .mount(&self.server)
            .await;
    }
}
