use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| {
            // 生产环境应收紧为前端域名白名单
            true
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        // 放开自定义 Header，避免预检失败
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
