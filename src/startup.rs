use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::configuration::CookieSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::TokenMiddleware;
use crate::routes::{current_session, health_check, login, logout, me};
use crate::session::SessionManager;

pub fn run(
    listener: TcpListener,
    session: SessionManager,
    cookie_settings: CookieSettings,
) -> Result<Server, std::io::Error> {
    let authority = session.authority().clone();
    let cookie_name = cookie_settings.name.clone();
    let session = web::Data::new(session);
    let cookie_settings = web::Data::new(cookie_settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .app_data(session.clone())
            .app_data(cookie_settings.clone())
            .route("/health_check", web::get().to(health_check))
            .route("/auth/login", web::post().to(login))
            .route("/auth/logout", web::post().to(logout))
            .route("/auth/session", web::get().to(current_session))
            .service(
                web::scope("/api")
                    .wrap(TokenMiddleware::new(authority.clone(), cookie_name.clone()))
                    .route("/me", web::get().to(me)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
