use actix_web::web;

pub mod account;
pub mod packages;
pub mod search;

/// Registers every frontend API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Package routes
        .service(packages::list_packages)
        .service(packages::package_names)
        .service(packages::get_package)
        .service(packages::get_package_version)
        .service(packages::get_package_report)
        .service(packages::like_package)
        // Search routes
        .service(search::search_packages)
        // Account routes
        .service(account::session);
}
