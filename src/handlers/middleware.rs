use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
};
use serde_json::Value;
use tracing::{error, warn};

use crate::models::ApiResponse;

const MAX_REQUEST_SIZE: u64 = 1024 * 1024;

/// Request validation middleware: content type and body size
pub async fn request_validation_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Value>>)> {
    validate_content_type(&request)?;
    validate_request_size(&request)?;

    Ok(next.run(request).await)
}

fn validate_content_type(
    request: &Request<Body>,
) -> Result<(), (StatusCode, Json<ApiResponse<Value>>)> {
    let method = request.method();

    if method == "POST" || method == "PUT" || method == "PATCH" {
        match request.headers().get("content-type") {
            Some(content_type) => {
                let content_type_str = content_type.to_str().unwrap_or("");
                if !content_type_str.starts_with("application/json") {
                    warn!("Invalid content type: {}", content_type_str);
                    return Err((
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        Json(ApiResponse::error(
                            "E415",
                            "Content-Type must be application/json",
                            None,
                        )),
                    ));
                }
            }
            None => {
                warn!("Missing content type header");
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error(
                        "E400",
                        "Content-Type header is required for requests with a body",
                        None,
                    )),
                ));
            }
        }
    }

    Ok(())
}

fn validate_request_size(
    request: &Request<Body>,
) -> Result<(), (StatusCode, Json<ApiResponse<Value>>)> {
    if let Some(content_length) = request.headers().get("content-length") {
        if let Ok(length) = content_length
            .to_str()
            .unwrap_or("")
            .parse::<u64>()
        {
            if length > MAX_REQUEST_SIZE {
                error!("Request too large: {} bytes", length);
                return Err((
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(ApiResponse::error(
                        "E413",
                        format!(
                            "Request size {} bytes exceeds maximum of {} bytes",
                            length, MAX_REQUEST_SIZE
                        ),
                        None,
                    )),
                ));
            }
        }
    }

    Ok(())
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert(
        "Referrer-Policy",
        "strict-origin-when-cross-origin".parse().unwrap(),
    );
    headers.insert(
        "Content-Security-Policy",
        "default-src 'self'".parse().unwrap(),
    );

    response
}
