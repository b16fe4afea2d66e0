use crate::{config::registry_config, principal::Principal};
use actix_web::{Responder, get, post, web};
use depot_registry_core::models::{
    LikeResponse, PackageInfo, PackageListing, PackageNames, PackageSummary, ReportInfo,
    VersionInfo,
};
use depot_registry_db::entities::{Package, PackageVersion, VersionReport};
use depot_scope::Scope;
use serde::Deserialize;

fn version_info(version: PackageVersion) -> VersionInfo {
    VersionInfo {
        version: version.version,
        description: version.description,
        dependencies: version.dependencies,
        uploader: version.uploader,
        published: version.published,
    }
}

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    /// 1-based page number
    page: Option<usize>,
}

/// Paged listing of every package, ordered by name
#[get("/api/packages")]
pub async fn list_packages(
    scope: web::Data<Scope>,
    query: web::Query<ListQuery>,
) -> crate::Result<impl Responder> {
    let db = depot_registry_db::datastore(&scope)?;
    let page_size = registry_config(&scope).default_page_size;
    let page = query.page.unwrap_or(1).max(1);

    let packages = Package::all(db.as_ref()).await?;
    let has_more = packages.len() > page.saturating_mul(page_size);

    let packages = packages
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .map(|package| {
            PackageSummary {
                name: package.name,
                latest_version: package.latest_version,
            }
        })
        .collect();

    Ok(web::Json(PackageListing {
        packages,
        next_page: has_more.then(|| page + 1),
    }))
}

/// Every known package name
#[get("/api/package-names")]
pub async fn package_names(scope: web::Data<Scope>) -> crate::Result<impl Responder> {
    let tracker = depot_registry_db::name_tracker(&scope)?;

    Ok(web::Json(PackageNames {
        packages: tracker.names(),
    }))
}

/// Package metadata with all versions
#[get("/api/packages/{name}")]
pub async fn get_package(
    path: web::Path<String>,
    scope: web::Data<Scope>,
) -> crate::Result<impl Responder> {
    let name = path.into_inner();
    let db = depot_registry_db::datastore(&scope)?;

    let package = Package::by_name(db.as_ref(), &name).await?;
    let versions = PackageVersion::list_for(db.as_ref(), &name).await?;

    let latest = versions
        .iter()
        .find(|v| v.version == package.latest_version)
        .cloned()
        .ok_or_else(|| {
            depot_registry_db::Error::NotFound(format!(
                "version `{name}@{}`",
                package.latest_version
            ))
        })?;

    Ok(web::Json(PackageInfo {
        name: package.name,
        latest: version_info(latest),
        versions: versions
            .into_iter()
            .map(version_info)
            .collect(),
        publisher_id: package.publisher_id,
        is_discontinued: package.is_discontinued,
        likes: package.likes,
    }))
}

/// One version of a package
#[get("/api/packages/{name}/versions/{version}")]
pub async fn get_package_version(
    path: web::Path<(String, String)>,
    scope: web::Data<Scope>,
) -> crate::Result<impl Responder> {
    let (name, version) = path.into_inner();
    let db = depot_registry_db::datastore(&scope)?;

    let found = PackageVersion::by_name_and_version(db.as_ref(), &name, &version).await?;

    Ok(web::Json(version_info(found)))
}

/// Analysis report of the latest version
#[get("/api/packages/{name}/report")]
pub async fn get_package_report(
    path: web::Path<String>,
    scope: web::Data<Scope>,
) -> crate::Result<impl Responder> {
    let name = path.into_inner();
    let db = depot_registry_db::datastore(&scope)?;

    let package = Package::by_name(db.as_ref(), &name).await?;
    let report =
        VersionReport::by_name_and_version(db.as_ref(), &name, &package.latest_version).await?;

    Ok(web::Json(ReportInfo {
        package: report.package,
        version: report.version,
        granted_points: report.granted_points,
        max_points: report.max_points,
        tags: report.tags,
    }))
}

/// Like a package as the authenticated user
#[post("/api/packages/{name}/likes")]
pub async fn like_package(
    principal: Principal,
    path: web::Path<String>,
    scope: web::Data<Scope>,
) -> crate::Result<impl Responder> {
    let name = path.into_inner();
    let db = depot_registry_db::datastore(&scope)?;

    let package = Package::like(db.as_ref(), &name).await?;
    tracing::info!(user = %principal.id, package = %package.name, "package liked");

    Ok(web::Json(LikeResponse {
        package: package.name,
        likes: package.likes,
    }))
}
