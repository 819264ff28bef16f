use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::auth::AuthGuard;
use crate::entry::EntryKind;
use crate::error::StoreError;
use crate::header::split_tags;
use crate::response::{encode, EncodedResponse, ResponseStatus};
use crate::router::{normalize_path, Method, ResponseFormat, Router};
use crate::store::{ContentStore, NewEntry};

/// Blog identity reported by `GET /blog` and used to build entry hrefs.
pub struct BlogInfo {
    pub url: String,
    pub title: String,
}

/// The seam the `PUT /blog` endpoint calls. The actual site generator
/// lives outside the API core and only consumes the store.
pub trait Regenerate: Send + Sync {
    fn regenerate(&self) -> Result<()>;
}

/// Regenerator that does nothing, for deployments rendering elsewhere.
pub struct NoRegeneration;

impl Regenerate for NoRegeneration {
    fn regenerate(&self) -> Result<()> {
        Ok(())
    }
}

/// A transport-independent request: the HTTP layer fills this in and maps
/// the resulting [`EncodedResponse`] back onto the wire.
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub fields: HashMap<String, String>,
    pub signature: Option<String>,
}

struct RequestData<'a> {
    fields: &'a HashMap<String, String>,
    resource_id: Option<String>,
}

struct Reply {
    http_status: u16,
    status: ResponseStatus,
    data: Value,
    location: Option<String>,
}

impl Reply {
    fn success(http_status: u16, data: Value) -> Reply {
        Reply { http_status, status: ResponseStatus::Success, data, location: None }
    }

    fn fail(http_status: u16, data: Value) -> Reply {
        Reply { http_status, status: ResponseStatus::Fail, data, location: None }
    }
}

type Handler = fn(&ApiServer, &RequestData) -> Result<Reply>;

/// Wires AuthGuard, Router, ContentStore and the response encoder
/// together: authenticate, match, invoke, encode. Handler failures never
/// escape; they become the 500 error envelope.
pub struct ApiServer {
    store: ContentStore,
    auth: AuthGuard,
    blog: BlogInfo,
    regenerator: Box<dyn Regenerate>,
    router: Router<Handler>,
}

impl ApiServer {
    pub fn new(
        store: ContentStore,
        secret: &str,
        blog: BlogInfo,
        regenerator: Box<dyn Regenerate>,
    ) -> ApiServer {
        let mut router: Router<Handler> = Router::new();
        router.register("/posts", Method::Get, get_posts);
        router.register("/posts/<id>", Method::Get, get_post);
        router.register("/posts", Method::Post, create_post);
        router.register("/posts/<id>", Method::Post, update_post);
        router.register("/posts/<id>", Method::Delete, delete_post);
        router.register("/blog", Method::Get, get_blog);
        router.register("/blog", Method::Put, regenerate_blog);

        ApiServer {
            store,
            auth: AuthGuard::new(secret),
            blog,
            regenerator,
            router,
        }
    }

    pub fn handle(&self, request: &ApiRequest) -> EncodedResponse {
        self.handle_at(request, Utc::now().timestamp())
    }

    /// Handles a request observed at `now` (unix seconds). Split out so
    /// freshness-window behavior is testable.
    pub fn handle_at(&self, request: &ApiRequest, now: i64) -> EncodedResponse {
        let (route, format) = normalize_path(&request.path);

        let verified = self.auth.verify(
            request.method,
            &route,
            &request.fields,
            request.signature.as_deref(),
            now,
        );
        if verified.is_err() {
            return encode(
                ResponseStatus::Error,
                json!("Invalid request signature"),
                403,
                format,
                None,
            );
        }

        let Some(hit) = self.router.find(request.method, &route) else {
            return route_not_found(format);
        };

        let data = RequestData {
            fields: &request.fields,
            resource_id: hit.resource_id,
        };
        match (hit.handler)(self, &data) {
            Ok(reply) => encode(reply.status, reply.data, reply.http_status, format, reply.location),
            Err(e) => encode(ResponseStatus::Error, json!(e.to_string()), 500, format, None),
        }
    }

    fn post_href(&self, slug: &str) -> String {
        format!("{}/api/posts/{}", self.blog.url, slug)
    }
}

/// The 404 fail envelope for an unroutable request. Also used by the
/// transport layer when the HTTP method itself is not part of the API.
pub fn route_not_found(format: ResponseFormat) -> EncodedResponse {
    encode(
        ResponseStatus::Fail,
        json!({"request": "Invalid method or endpoint"}),
        404,
        format,
        None,
    )
}

fn get_posts(api: &ApiServer, data: &RequestData) -> Result<Reply> {
    let limit = data
        .fields
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(10);

    let mut posts = vec![];
    for slug in api.store.list(EntryKind::Post, Some(limit))? {
        let entry = api.store.load(EntryKind::Post, &slug)?;
        let mut item = entry.to_json();
        let fields = item.as_object_mut().unwrap();
        fields.remove("content");
        fields.insert("href".to_string(), Value::from(api.post_href(&slug)));
        fields.insert("id".to_string(), Value::from(slug));
        posts.push(item);
    }
    Ok(Reply::success(200, json!({"posts": posts})))
}

fn get_post(api: &ApiServer, data: &RequestData) -> Result<Reply> {
    let id = data.resource_id.as_deref().unwrap_or_default();
    match api.store.load(EntryKind::Post, id) {
        Ok(entry) => Ok(Reply::success(200, json!({"post": entry.to_json()}))),
        Err(StoreError::NotFound) => {
            Ok(Reply::fail(404, json!({"id": format!("{} not found", id)})))
        }
        Err(e) => Err(e.into()),
    }
}

fn create_post(api: &ApiServer, data: &RequestData) -> Result<Reply> {
    let title = data.fields.get("title");
    let content = data.fields.get("content");
    if title.is_none() || content.is_none() {
        let mut messages = Map::new();
        if title.is_none() {
            messages.insert("title".to_string(), Value::from("A title is required"));
        }
        if content.is_none() {
            messages.insert("content".to_string(), Value::from("Content is required"));
        }
        return Ok(Reply::fail(400, Value::Object(messages)));
    }

    let tags = data.fields.get("tags").map(|t| split_tags(t)).unwrap_or_default();
    let slug = api.store.create(
        EntryKind::Post,
        NewEntry {
            title: title.unwrap().clone(),
            tags,
            content: content.unwrap().clone(),
            date: None,
        },
    )?;

    let location = format!("/posts/{}", slug);
    let mut reply = Reply::success(201, json!({
        "href": api.post_href(&slug),
        "id": slug,
    }));
    reply.location = Some(location);
    Ok(reply)
}

fn update_post(api: &ApiServer, data: &RequestData) -> Result<Reply> {
    let id = data.resource_id.as_deref().unwrap_or_default();
    let mut entry = match api.store.load(EntryKind::Post, id) {
        Ok(entry) => entry,
        Err(StoreError::NotFound) => {
            return Ok(Reply::fail(404, json!({"id": format!("'{}' does not exist.", id)})));
        }
        Err(e) => return Err(e.into()),
    };

    let mut changed_fields = vec![];
    if let Some(title) = data.fields.get("title") {
        entry.title = title.clone();
        changed_fields.push("title");
    }
    if let Some(tags) = data.fields.get("tags") {
        entry.tags = split_tags(tags);
        changed_fields.push("tags");
    }
    if let Some(content) = data.fields.get("content") {
        entry.content = content.clone();
        changed_fields.push("content");
    }
    if changed_fields.is_empty() {
        return Ok(Reply::fail(400, json!({"post": "At least one change is required"})));
    }

    api.store.edit(EntryKind::Post, id, &entry)?;
    Ok(Reply::success(200, json!({"changed_fields": changed_fields})))
}

fn delete_post(api: &ApiServer, data: &RequestData) -> Result<Reply> {
    let id = data.resource_id.as_deref().unwrap_or_default();
    if api.store.delete(EntryKind::Post, id)? {
        Ok(Reply::success(200, Value::Null))
    } else {
        Ok(Reply::fail(404, json!({"id": format!("'{}' does not exist.", id)})))
    }
}

fn get_blog(api: &ApiServer, _data: &RequestData) -> Result<Reply> {
    Ok(Reply::success(200, json!({
        "blog": {
            "url": api.blog.url,
            "name": api.blog.title,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })))
}

fn regenerate_blog(api: &ApiServer, _data: &RequestData) -> Result<Reply> {
    let start = Instant::now();
    api.regenerator.regenerate()?;
    let elapsed = start.elapsed().as_secs_f64();
    Ok(Reply::success(200, json!({
        "message": format!("blog generated in {:.3}s", elapsed),
    })))
}
