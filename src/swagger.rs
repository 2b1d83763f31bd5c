use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::dashboard::get_dashboard,
        handlers::dashboard::get_waiting_reservations,
    ),
    components(
        schemas(
            Period,
            ChartBucket,
            DashboardStats,
            DashboardReport,
            ReservationStatus,
            ReservationRecord,
            ApiError,
            DashboardApiResponse,
            ReservationListApiResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness check"),
        (name = "dashboard", description = "Admin dashboard analytics API"),
    ),
    info(
        title = "Booking Dashboard API",
        version = "0.1.0",
        description = "Revenue and customer analytics for the booking admin dashboard",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
