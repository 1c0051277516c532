use crate::api::{attendance, bulk, health};
use actix_web::{Resource, web};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(fallback(web::resource("/").route(web::get().to(health::index))))
        .service(fallback(
            web::resource("/health").route(web::get().to(health::health)),
        ))
        .service(fallback(
            web::resource("/clockin").route(web::post().to(attendance::clock_in)),
        ))
        .service(fallback(
            web::resource("/clockout").route(web::post().to(attendance::clock_out)),
        ))
        .service(
            web::scope("/attendance")
                // /attendance/{employeeId}
                .service(fallback(
                    web::resource("/{employeeId}").route(web::get().to(attendance::get_attendance)),
                ))
                // /attendance/{employeeId}/summary
                .service(fallback(
                    web::resource("/{employeeId}/summary")
                        .route(web::get().to(attendance::get_attendance_summary)),
                )),
        )
        .service(
            web::scope("/bulk")
                // /bulk/clockin
                .service(fallback(
                    web::resource("/clockin").route(web::post().to(bulk::bulk_clock_in)),
                ))
                // /bulk/clockout
                .service(fallback(
                    web::resource("/clockout").route(web::post().to(bulk::bulk_clock_out)),
                )),
        );
}

/// Known path, unsupported method: answer with the catalogue envelope.
fn fallback(resource: Resource) -> Resource {
    resource.default_service(web::route().to(health::method_not_allowed))
}
