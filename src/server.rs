use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use ntex::http::StatusCode;
use ntex::util::Bytes;
use ntex::web;
use ntex::web::HttpRequest;
use spdlog::info;

use crate::api::{route_not_found, ApiRequest, ApiServer, BlogInfo};
use crate::config::Config;
use crate::generate::SiteGenerator;
use crate::response::EncodedResponse;
use crate::router::{normalize_path, Method};
use crate::store::ContentStore;

/// Request-signature header, carried out-of-band from the signed fields.
pub const AUTH_HEADER: &str = "X-Pressed-Auth";

fn parse_fields(raw: &[u8]) -> HashMap<String, String> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(raw).unwrap_or_else(|_| vec![]);
    pairs.into_iter().collect()
}

fn to_http_response(encoded: EncodedResponse) -> web::HttpResponse {
    let status = StatusCode::from_u16(encoded.http_status)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = web::HttpResponse::build(status);
    builder
        .content_type(encoded.content_type)
        .header("Access-Control-Allow-Origin", "*");
    if let Some(ref location) = encoded.location {
        builder.header("Location", location.as_str());
    }
    builder.body(encoded.body)
}

/// Adapts an incoming HTTP request to the transport-independent API:
/// POST fields come from the form body, everything else from the query
/// string, and the signature from the auth header. An `/api` mount
/// prefix is accepted and stripped.
async fn dispatch(
    req: HttpRequest,
    body: Bytes,
    state: web::types::State<Arc<ApiServer>>,
) -> web::HttpResponse {
    let path = req.path();
    let path = match path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    };

    let Some(method) = Method::parse(req.method().as_str()) else {
        let (_, format) = normalize_path(&path);
        return to_http_response(route_not_found(format));
    };

    let fields = if method == Method::Post {
        parse_fields(&body)
    } else {
        parse_fields(req.uri().query().unwrap_or("").as_bytes())
    };

    let signature = req
        .headers()
        .get(AUTH_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let request = ApiRequest {
        method,
        path,
        fields,
        signature,
    };
    to_http_response(state.handle(&request))
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let store = ContentStore::new(&config.paths.posts_dir, &config.paths.pages_dir);
    let generator = SiteGenerator::new(&config);
    let blog = BlogInfo {
        url: config.blog.url.clone(),
        title: config.blog.title.clone(),
    };
    let api = Arc::new(ApiServer::new(store, &config.blog.api_secret, blog, Box::new(generator)));

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Serving blog API for {}", config.blog.url);

    web::HttpServer::new(move || {
        web::App::new()
            .state(api.clone())
            .default_service(web::route().to(dispatch))
    })
    .bind((bind_addr, bind_port))?
    .run()
    .await
}
