use actix_web::{web, HttpResponse, Result, ResponseError};
use crate::models::*;
use crate::services::DashboardService;

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Chart points and period statistics", body = DashboardApiResponse),
        (status = 400, description = "Unknown period"),
        (status = 502, description = "Reservation source unavailable")
    )
)]
pub async fn get_dashboard(
    dashboard_service: web::Data<DashboardService>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse> {
    let period = match query.period.as_deref().map(str::parse::<Period>).transpose() {
        Ok(period) => period.unwrap_or_else(|| dashboard_service.default_period()),
        Err(e) => return Ok(e.error_response()),
    };

    match dashboard_service.get_report(period).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/dashboard/waiting",
    tag = "dashboard",
    params(WaitingReservationQuery),
    responses(
        (status = 200, description = "Latest reservations waiting for approval", body = ReservationListApiResponse),
        (status = 502, description = "Reservation source unavailable")
    )
)]
pub async fn get_waiting_reservations(
    dashboard_service: web::Data<DashboardService>,
    query: web::Query<WaitingReservationQuery>,
) -> Result<HttpResponse> {
    match dashboard_service.get_waiting_reservations(query.limit).await {
        Ok(reservations) => Ok(HttpResponse::Ok().json(ApiResponse::success(reservations))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/dashboard")
            .route("", web::get().to(get_dashboard))
            .route("/waiting", web::get().to(get_waiting_reservations))
    );
}
