use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];
const ALLOWED_HEADERS: [HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

fn joined<T: AsRef<str>>(items: &[T]) -> HeaderValue {
    let value = items.iter().map(|i| i.as_ref()).collect::<Vec<_>>().join(", ");
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("*"))
}

/// Permissive CORS for every route. `CorsLayer` answers every OPTIONS request
/// itself; the set-header layers add the methods and headers lists to the
/// remaining responses, errors included.
pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS);

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            joined(&ALLOWED_METHODS.map(|m| m.to_string())),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            joined(&ALLOWED_HEADERS),
        ))
        .layer(cors)
}
