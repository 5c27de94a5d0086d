use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};

use orgdesk_api::app::{AppServices, build_app};
use orgdesk_auth::Hs256TokenCodec;
use orgdesk_infra::{AppConfig, CredentialStore, InMemoryCredentialStore, PgCredentialStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments use the environment.
    let _ = dotenvy::dotenv();
    orgdesk_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(?config, "configuration loaded");

    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => Arc::new(
            PgCredentialStore::connect(url)
                .await
                .context("failed to connect to postgres")?,
        ),
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let codec = Arc::new(Hs256TokenCodec::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::hours(config.token_ttl_hours),
    ));
    let services = Arc::new(AppServices::new(store, codec));

    if let Some(admin) = &config.bootstrap_admin {
        let created = services
            .auth
            .ensure_platform_admin(&admin.email, &admin.password, Utc::now())
            .await
            .context("failed to bootstrap platform admin")?;
        info!(email = %admin.email, created, "platform admin ready");
    }

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
