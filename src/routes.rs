use crate::{
    api::{attendance, report, schedule, truck, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::governor::{clock::QuantaInstant, middleware::NoOpMiddleware};
use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(
        requests_per_min: u32,
    ) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware<QuantaInstant>> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .finish()
            .unwrap()
    }

    let login_conf = build_limiter(config.rate_login_per_min);
    let register_conf = build_limiter(config.rate_register_per_min);
    let refresh_conf = build_limiter(config.rate_refresh_per_min);
    let protected_conf = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_conf))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_conf))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_conf))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/session")
                    .wrap(Governor::new(&refresh_conf))
                    .route(web::get().to(handlers::session)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_conf))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(Governor::new(&protected_conf)) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::check_in))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/{id}/check-out
                    .service(
                        web::resource("/{id}/check-out")
                            .route(web::put().to(attendance::check_out)),
                    )
                    // /attendance/{id}/verify
                    .service(web::resource("/{id}/verify").route(web::put().to(attendance::verify)))
                    // /attendance/{id}/reject
                    .service(web::resource("/{id}/reject").route(web::put().to(attendance::reject))),
            )
            .service(
                web::scope("/schedules")
                    // /schedules
                    .service(
                        web::resource("")
                            .route(web::post().to(schedule::create_schedule))
                            .route(web::get().to(schedule::list_schedules)),
                    )
                    // /schedules/calendar (before /{id})
                    .service(
                        web::resource("/calendar").route(web::get().to(schedule::calendar_view)),
                    )
                    // /schedules/{id}
                    .service(
                        web::resource("/{id}").route(web::delete().to(schedule::delete_schedule)),
                    ),
            )
            .service(
                web::scope("/reports")
                    // /reports
                    .service(
                        web::resource("")
                            .route(web::post().to(report::create_report))
                            .route(web::get().to(report::list_reports)),
                    )
                    // /reports/{id}
                    .service(web::resource("/{id}").route(web::get().to(report::get_report)))
                    // /reports/{id}/status
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(report::update_report_status)),
                    ),
            )
            .service(
                web::scope("/trucks")
                    // /trucks
                    .service(
                        web::resource("")
                            .route(web::post().to(truck::create_truck))
                            .route(web::get().to(truck::list_trucks)),
                    )
                    // /trucks/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(truck::update_truck))
                            .route(web::delete().to(truck::delete_truck)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
