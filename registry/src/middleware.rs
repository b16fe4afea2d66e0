//! Request logging and response hardening shared by every registry app.

use actix_web::{
    HttpResponse,
    body::{BoxBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::{
        CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue,
        X_CONTENT_TYPE_OPTIONS,
    },
    middleware::Next,
};
use depot_registry_core::{ErrorResponse, PublicErrorType};
use std::time::Instant;

/// Headers describing the original body, which a rewrite replaces.
fn describes_body(name: &HeaderName) -> bool {
    *name == CONTENT_TYPE || *name == CONTENT_LENGTH || *name == CONTENT_ENCODING
}

/// Logs every request, stamps `x-content-type-options: nosniff` and
/// rewrites 5xx bodies so that only structured, non-internal error
/// descriptions reach the caller. A rewritten response keeps the handler's
/// headers, apart from those describing the discarded body.
///
/// Use with [`actix_web::middleware::from_fn`].
pub async fn sanitize(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.path().to_string();

    let mut res = next.call(req).await?.map_into_boxed_body();
    let status = res.status();

    tracing::info!(
        %method,
        %path,
        status = status.as_u16(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "handled request"
    );

    if !status.is_server_error() {
        res.headers_mut()
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        return Ok(res);
    }

    let (req, res) = res.into_parts();
    let kept: Vec<(HeaderName, HeaderValue)> = res
        .headers()
        .iter()
        .filter(|(name, _)| !describes_body(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let body = actix_web::body::to_bytes(res.into_body())
        .await
        .unwrap_or_default();

    let public = serde_json::from_slice::<ErrorResponse>(&body)
        .ok()
        .filter(|err| err.error != PublicErrorType::InternalServerError)
        .unwrap_or_else(ErrorResponse::internal);

    let mut builder = HttpResponse::build(status);
    for header in kept {
        builder.append_header(header);
    }

    let sanitized = builder
        .insert_header((X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .json(public);

    Ok(ServiceResponse::new(req, sanitized))
}
