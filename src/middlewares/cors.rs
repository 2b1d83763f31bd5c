use actix_cors::Cors;

/// 仪表盘接口只读，只放行 GET 与预检请求
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
