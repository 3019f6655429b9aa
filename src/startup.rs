use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenAuthenticator;
use crate::configuration::Settings;
use crate::middleware::CookieAuth;
use crate::routes::{current_user, dashboard, health_check, login, login_page, logout};

pub fn run(
    listener: TcpListener,
    settings: Settings,
    authenticator: TokenAuthenticator,
) -> Result<Server, std::io::Error> {
    let cookies = settings.cookies.clone();
    let settings = web::Data::new(settings);
    let authenticator_data = web::Data::new(authenticator.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(settings.clone())
            .app_data(authenticator_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/logout", web::post().to(logout))
            // Session-aware routes (anonymous allowed, silent refresh applies)
            .service(
                web::resource("/login")
                    .route(web::get().to(login_page))
                    .route(web::post().to(login))
                    .wrap(CookieAuth::optional(authenticator.clone(), cookies.clone())),
            )
            .service(
                web::resource("/me")
                    .route(web::get().to(current_user))
                    .wrap(CookieAuth::optional(authenticator.clone(), cookies.clone())),
            )
            // Admin area (redirects to /login when unauthenticated)
            .service(
                web::scope("/admin")
                    .route("", web::get().to(dashboard))
                    .wrap(CookieAuth::required(authenticator.clone(), cookies.clone())),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
