use std::error::Error;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Method, StatusCode},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::SameSite;
use axum_login::{
    login_required,
    tower_sessions::{CachingSessionStore, ExpiredDeletion, Expiry, SessionManagerLayer},
    AuthManagerLayer, AuthManagerLayerBuilder,
};
use oauth2::{basic::BasicClient, AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};
use reqwest::Url;
use sqlx::PgPool;
use time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};
use tower_sessions_moka_store::MokaStore;
use tower_sessions_sqlx_store::PostgresStore;

type SessionStore = CachingSessionStore<MokaStore, PostgresStore>;

use crate::{
    app_state::AppState,
    auth::{self, AuthBackend},
    config::Settings,
    domain::ports::inbound::BillingService,
    factory, routes,
};

pub async fn create(
    connection_pool: PgPool,
    billing_service: std::sync::Arc<dyn BillingService>,
    config: Settings,
) -> Result<Router<()>, Box<dyn Error>> {
    let auth_layer = new_auth_layer(connection_pool.clone(), &config).await?;

    let billing_app = Router::new()
        .nest("/projects", routes::projects::router())
        .nest("/expense-reports", routes::expense_reports::router())
        .nest("/time-entries", routes::time_entries::router())
        .nest("/invoices", routes::invoices::router())
        .route_layer(login_required!(AuthBackend));

    let app_url = Url::parse(&config.application.app_url)?;
    let app_state = AppState::new(app_url, connection_pool, billing_service);

    let allowed_origin = config.application.app_url.trim_end_matches('/').to_string();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().unwrap_or_default() == allowed_origin
        }));

    Ok(Router::new()
        .route("/health", get(health))
        .merge(billing_app)
        .merge(auth::router())
        .layer(auth_layer)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default())))
}

async fn health(State(app_state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(&*app_state.db_pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn new_auth_layer(
    connection_pool: PgPool,
    config: &Settings,
) -> Result<AuthManagerLayer<AuthBackend, SessionStore>, Box<dyn Error>> {
    let auth = &config.auth;
    let client = BasicClient::new(
        ClientId::new(auth.client_id.clone()),
        Some(ClientSecret::new(auth.client_secret.clone())),
        AuthUrl::new(auth.auth_url.clone())?,
        Some(TokenUrl::new(auth.token_url.clone())?),
    )
    .set_redirect_uri(RedirectUrl::new(auth.redirect_url.clone())?);

    // DB-backed sessions survive restarts
    let db_store = PostgresStore::new(connection_pool.clone());
    db_store.migrate().await?;

    tokio::task::spawn(
        db_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    let cache_store = MokaStore::new(Some(2_000));
    let session_store = CachingSessionStore::new(cache_store, db_store);

    let cookie_domain = config.application.cookie_domain.clone();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_domain != "localhost")
        .with_domain(cookie_domain)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(7)));

    let backend = AuthBackend::new(
        factory::employee_repository(connection_pool),
        client,
        Url::parse(&auth.userinfo_url)?,
    );
    Ok(AuthManagerLayerBuilder::new(backend, session_layer).build())
}
