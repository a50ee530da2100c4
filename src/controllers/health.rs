use actix_web::{web, HttpResponse, Responder};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health/").route(web::get().to(health_check)));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Server is up!"
    }))
}
