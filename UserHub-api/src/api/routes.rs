use axum::{
    middleware,
    routing::{get, post},
    Router,
    Extension,
};
use tracing::debug;

use user_hub_domain::auth::{auth_middleware, authorize, configure_auth};
use crate::api::handlers::{auth, health, users};
use crate::openapi::configure_swagger_routes;

type AppState = users::UserService;

/// Create the application router
pub async fn create_app() -> Router {
    debug!("Creating application router");

    // Create the user service using the factory function
    let user_service = users::create_service();

    // Create health service using factory function
    let health_service = health::create_health_service();

    // Management routes under /api/v1 require authentication plus the
    // ADMIN or MANAGER role; the admin-only subset re-checks inside the
    // handlers
    let api_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", get(users::get_user)
                            .put(users::update_user)
                            .delete(users::delete_user))
        .route("/users/:id/unlock", post(users::unlock_user))
        .layer(middleware::from_fn_with_state(
            user_service.clone(),
            authorize::require_any_role::<AppState>(&["ADMIN", "MANAGER"])
        ))
        .layer(middleware::from_fn_with_state(
            user_service.clone(),
            auth_middleware::<AppState>  // Authentication must happen before authorization
        ));

    debug!("API routes configured");

    // Set up public routes that don't require authentication
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/register", post(auth::register))
        .route("/verify-email/:user_id/:token", get(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .layer(Extension(health_service));

    debug!("Public routes configured");

    // Set up authentication routes
    let auth_routes = Router::new()
        .route("/auth/info", get(auth::auth_info))
        .route("/auth/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(
            user_service.clone(),
            auth_middleware::<AppState>
        ));

    debug!("Auth routes configured");

    // Combine all routes
    let app = Router::new()
        .merge(public_routes)
        .merge(auth_routes);

    debug!("Base routes merged");

    let app = app.nest("/api/v1", api_routes)
        .with_state(user_service);

    debug!("API routes nested");

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);

    debug!("Swagger UI merged");

    // Apply security configuration
    let app = configure_auth(app);
    debug!("Security configuration applied");

    // Initialize health check service startup time
    health::initialize_server_start_time();
    debug!("Health check service initialized");

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    // Get Swagger UI routes
    let swagger = configure_swagger_routes();

    // Merge Swagger UI with the app router
    app.merge(swagger)
}
