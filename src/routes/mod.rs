pub mod auth;
pub mod health;
pub mod oauth;
pub mod todos;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::index)
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(oauth::google_login)
        .service(oauth::callback)
        .service(
            web::resource("/protected")
                .route(web::get().to(auth::protected))
                .wrap(AuthMiddleware),
        )
        .service(
            web::scope("/todos")
                .wrap(AuthMiddleware)
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::update_todo)
                .service(todos::delete_todo),
        );
}
