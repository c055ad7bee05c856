// File: services/clubhouse_portal/src/main.rs
use clubhouse_common::logging;
use clubhouse_config::{ensure_dotenv_loaded, load_config};
use clubhouse_portal::{api_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ensure_dotenv_loaded();
    let config = Arc::new(load_config()?);
    logging::init_from_config(&config.logging);

    let state = AppState::from_config(config.clone())?;
    #[allow(unused_mut)] // mutated only by the openapi feature
    let mut app = api_router(state);

    #[cfg(feature = "openapi")]
    {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Clubhouse Portal API",
                version = "0.1.0",
                description = "Club management portal endpoints",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(clubhouse_payments::doc::PaymentsApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("Club API at {}", config.api.normalized_base_url());
    if !config.use_payments {
        info!("Payments are disabled (use_payments = false)");
    }

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
