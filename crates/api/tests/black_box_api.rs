use std::sync::Arc;

use chrono::{Datelike, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use orgdesk_api::app::{AppServices, build_app};
use orgdesk_auth::{Hs256TokenCodec, JwtClaims, Role};
use orgdesk_core::{OrganizationId, UserId};
use orgdesk_infra::InMemoryCredentialStore;
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "root@platform.io";
const ADMIN_PASSWORD: &str = "changeme123";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over the in-memory store, on an ephemeral port.
        let codec = Arc::new(Hs256TokenCodec::new(JWT_SECRET.as_bytes(), ChronoDuration::hours(8)));
        let services = Arc::new(AppServices::new(Arc::new(InMemoryCredentialStore::new()), codec));
        services
            .auth
            .ensure_platform_admin(ADMIN_EMAIL, ADMIN_PASSWORD, Utc::now())
            .await
            .expect("bootstrap admin");

        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn submit_registration(&self, code: &str, email: &str, industry: &str) -> reqwest::Response {
        self.client
            .post(self.url("/registrations"))
            .json(&json!({
                "orgName": "Green Field Academy",
                "orgType": "PRIVATE",
                "orgCode": code,
                "contactPerson": "Grace Hopper",
                "officialEmail": email,
                "industryType": industry,
            }))
            .send()
            .await
            .unwrap()
    }

    async fn approve(&self, token: &str, request_id: &str) -> reqwest::Response {
        self.client
            .patch(self.url(&format!("/registrations/{request_id}/status")))
            .bearer_auth(token)
            .json(&json!({ "status": "APPROVED", "assignedTier": "STANDARD" }))
            .send()
            .await
            .unwrap()
    }

    /// Register and approve a school; returns the admin token.
    async fn provision_school(&self, code: &str, email: &str) -> String {
        let res = self.submit_registration(code, email, "EDUCATION").await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let request: Value = res.json().await.unwrap();

        let root = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let res = self.approve(&root, request["id"].as_str().unwrap()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let update: Value = res.json().await.unwrap();
        let password = update["credentials"]["password"].as_str().unwrap().to_string();

        self.login(email, &password).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(role: Role, organization_id: Option<OrganizationId>, issued_ago: ChronoDuration) -> String {
    let iat = Utc::now() - issued_ago;
    let claims = JwtClaims {
        sub: UserId::new(),
        role,
        organization_id,
        iat: iat.timestamp(),
        exp: (iat + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_distinguish_missing_and_invalid_tokens() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "missing_token");

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(res).await, "missing_token");

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");

    let expired = mint_jwt(Role::OrgAdmin, Some(OrganizationId::new()), ChronoDuration::hours(1));
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");
}

#[tokio::test]
async fn identity_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let org = OrganizationId::new();
    let token = mint_jwt(Role::Teacher, Some(org), ChronoDuration::zero());

    let res = srv.client.get(srv.url("/whoami")).bearer_auth(token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "TEACHER");
    assert_eq!(body["organizationId"].as_str().unwrap(), org.to_string());
}

#[tokio::test]
async fn login_does_not_reveal_which_part_was_wrong() {
    let srv = TestServer::spawn().await;

    let unknown = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "nobody@platform.io", "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    let wrong = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn registration_approval_provisions_a_working_tenant() {
    let srv = TestServer::spawn().await;

    let res = srv.submit_registration(" gfa ", "Admin@GFA.edu", "EDUCATION").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let request: Value = res.json().await.unwrap();
    assert_eq!(request["orgCode"], "GFA");
    assert_eq!(request["status"], "PENDING");
    let request_id = request["id"].as_str().unwrap().to_string();

    let res = srv.submit_registration("GFA", "other@gfa.edu", "EDUCATION").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "duplicate_registration");

    let root = srv.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = srv.approve(&root, &request_id).await;
    assert_eq!(res.status(), StatusCode::OK);
    let update: Value = res.json().await.unwrap();
    assert_eq!(update["request"]["status"], "APPROVED");
    assert_eq!(update["credentials"]["email"], "admin@gfa.edu");
    let password = update["credentials"]["password"].as_str().unwrap().to_string();

    let res = srv.approve(&root, &request_id).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "already_approved");

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "admin@gfa.edu", "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await.unwrap();
    assert_eq!(login["user"]["role"], "SCHOOL_ADMIN");
    assert_eq!(login["user"]["organization"]["code"], "GFA");
    assert!(login["user"].get("passwordHash").is_none());

    // The school admin is not a platform reviewer.
    let school_admin = login["token"].as_str().unwrap();
    let res = srv
        .client
        .get(srv.url("/registrations"))
        .bearer_auth(school_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "forbidden");
}

#[tokio::test]
async fn invalid_registration_reports_fields() {
    let srv = TestServer::spawn().await;
    let res = srv.submit_registration("GFA", "not-an-email", "EDUCATION").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["fields"]["official_email"].is_array());

    let res = srv.submit_registration("GFA", "admin@gfa.edu", "SPACE_AGENCY").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sequences_are_scoped_and_gated_by_kind() {
    let srv = TestServer::spawn().await;
    let token = srv.provision_school("GFA", "admin@gfa.edu").await;
    let year = Utc::now().year();

    let mint = |kind: &'static str| {
        srv.client
            .post(srv.url(&format!("/sequences/{kind}")))
            .bearer_auth(&token)
            .send()
    };

    let res = mint("admission").await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["identifier"], format!("GFA/{year}/0001"));

    let body: Value = mint("admission").await.unwrap().json().await.unwrap();
    assert_eq!(body["identifier"], format!("GFA/{year}/0002"));

    let body: Value = mint("letter").await.unwrap().json().await.unwrap();
    assert_eq!(body["identifier"], format!("GFA/{year}/001"));

    let res = mint("passport").await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Platform admin holds neither manage_letters nor manage_students.
    let root = srv.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = srv
        .client
        .post(srv.url("/sequences/letter"))
        .bearer_auth(root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn fresh_tenant_has_no_invoice_due() {
    let srv = TestServer::spawn().await;
    let token = srv.provision_school("GFA", "admin@gfa.edu").await;

    let res = srv
        .client
        .get(srv.url("/invoices/current"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body.is_null());

    let res = srv
        .client
        .get(srv.url("/admin/invoices"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let root = srv.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let res = srv
        .client
        .get(srv.url("/admin/invoices"))
        .bearer_auth(root)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn school_admin_manages_members() {
    let srv = TestServer::spawn().await;
    let token = srv.provision_school("GFA", "admin@gfa.edu").await;

    let res = srv
        .client
        .post(srv.url("/users"))
        .bearer_auth(&token)
        .json(&json!({ "fullName": "Alan Turing", "email": "alan@gfa.edu", "role": "TEACHER" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let teacher_id = created["member"]["id"].as_str().unwrap().to_string();
    let password = created["credentials"]["password"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url("/users"))
        .bearer_auth(&token)
        .json(&json!({ "fullName": "Eve", "email": "eve@gfa.edu", "role": "SUPER_ADMIN" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let teacher = srv.login("alan@gfa.edu", &password).await;
    let res = srv.client.get(srv.url("/users")).bearer_auth(&teacher).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url(&format!("/users/{teacher_id}/deactivate")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "alan@gfa.edu", "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "account_disabled");

    let res = srv.client.get(srv.url("/users")).bearer_auth(&token).send().await.unwrap();
    let members: Value = res.json().await.unwrap();
    assert_eq!(members.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn explain_reports_granting_roles() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(Role::Teacher, Some(OrganizationId::new()), ChronoDuration::zero());

    let res = srv
        .client
        .get(srv.url("/rbac/explain?permission=manage_students"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["explanation"]["granted"], false);
    assert!(
        body["explanation"]["denialReason"]["grantingRoles"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r == "SCHOOL_ADMIN")
    );

    let res = srv
        .client
        .get(srv.url("/rbac/explain?permission=fly"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.client.get(srv.url("/rbac/roles")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
