use crate::config::{MarketConfig, StoreBackend};
use crate::handlers::{admin, auth, cart, fruits, health, inventory, orders};
use crate::middleware::{authenticate, require_admin};
use crate::services::{
    FruitGrader, HttpGrader, JwtService, LocalStorage, MarketStore, MemoryStore, MongoStore,
    Storage,
};
use axum::{
    extract::DefaultBodyLimit,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use service_core::observability::REQUEST_ID_HEADER;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: MarketConfig,
    pub store: Arc<dyn MarketStore>,
    pub storage: Arc<dyn Storage>,
    pub grader: Arc<dyn FruitGrader>,
    pub jwt: JwtService,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

async fn connect_store(config: &MarketConfig) -> Result<Arc<dyn MarketStore>, AppError> {
    match config.store.backend {
        StoreBackend::MongoDb => {
            let mongo = config.store.mongodb.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("MongoDB backend selected without settings"))
            })?;
            let store = MongoStore::connect(&mongo.uri, &mongo.database).await?;
            store.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

impl Application {
    pub async fn build(config: MarketConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.uploads.dir).await.map_err(|e| {
                tracing::error!(
                    "Failed to initialize local storage at {}: {}",
                    config.uploads.dir,
                    e
                );
                e
            })?,
        );

        let state = AppState {
            config: config.clone(),
            store,
            storage,
            grader: Arc::new(HttpGrader::new(&config.grading)),
            jwt: JwtService::new(&config.auth),
        };

        let app = router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn MarketStore> {
        self.state.store.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(
            Router::new()
                .route("/auth/profile", get(auth::profile))
                .route_layer(from_fn_with_state(state.clone(), authenticate)),
        );

    // Layers run bottom-up: authenticate, then the role check
    let admin_routes = Router::new()
        .route("/admin/stats", get(admin::stats))
        .route("/admin/stats/ids", get(admin::selected_stats))
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    let fruit_routes = Router::new()
        .route("/fruits", get(fruits::list_fruits))
        .route("/fruits/upload", post(fruits::upload_fruit))
        .route("/fruits/manual", post(fruits::add_manual_fruit))
        .route("/fruits/quality", get(fruits::quality_fruits))
        .route("/fruits/available", get(fruits::available_fruits))
        .route("/fruits/inventory", get(inventory::list_inventory))
        .route("/fruits/inventory/stats", get(inventory::inventory_stats))
        .route("/fruits/by-grade/:grade", get(fruits::fruits_by_grade))
        .route("/fruits/by-status/:status", get(fruits::fruits_by_status))
        .route(
            "/fruits/:id",
            get(fruits::get_fruit)
                .put(fruits::update_fruit)
                .delete(fruits::delete_fruit),
        );

    // GET /cart/:id lists a user's cart; PUT and DELETE address one line
    let cart_routes = Router::new()
        .route("/cart", post(cart::add_to_cart))
        .route("/cart/user/:user_id", axum::routing::delete(cart::clear_cart))
        .route(
            "/cart/:id",
            get(cart::list_cart)
                .put(cart::update_cart_item)
                .delete(cart::delete_cart_item),
        );

    let order_routes = Router::new()
        .route("/orders", post(orders::create_order))
        .route("/orders/all", get(orders::list_all_orders))
        .route("/orders/user/:user_id", get(orders::list_user_orders))
        .route(
            "/orders/:order_id",
            get(orders::get_order)
                .patch(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/orders/:order_id/status", patch(orders::update_order_status));

    let api = Router::new()
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(fruit_routes)
        .merge(cart_routes)
        .merge(order_routes);

    let max_body = state.config.uploads.max_bytes;
    let upload_dir = state.config.uploads.dir.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
