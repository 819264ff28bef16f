use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    pub fn parse(method: &str) -> Option<Method> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
}

/// Cleans a request path into the canonical route used for matching and
/// signing: leading/trailing slashes stripped, and a trailing `.json`/`.xml`
/// suffix removed and reported as the response format (JSON by default).
pub fn normalize_path(path: &str) -> (String, ResponseFormat) {
    let route = format!("/{}", path.trim_matches('/'));
    if let Some(stripped) = route.strip_suffix(".json") {
        (stripped.to_string(), ResponseFormat::Json)
    } else if let Some(stripped) = route.strip_suffix(".xml") {
        (stripped.to_string(), ResponseFormat::Xml)
    } else {
        (route, ResponseFormat::Json)
    }
}

pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub resource_id: Option<String>,
}

struct Route<H> {
    method: Method,
    pattern: Regex,
    handler: H,
}

/// Method + path-pattern dispatch table. Patterns are literal routes with
/// at most one `<id>` placeholder capturing the remaining path segment.
/// Matching walks the table in registration order; the first hit wins.
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> Router<H> {
    pub fn new() -> Router<H> {
        Router { routes: vec![] }
    }

    pub fn register(&mut self, pattern: &str, method: Method, handler: H) {
        self.routes.push(Route {
            method,
            pattern: compile_pattern(pattern),
            handler,
        });
    }

    pub fn find(&self, method: Method, route: &str) -> Option<RouteMatch<H>> {
        for registered in &self.routes {
            if registered.method != method {
                continue;
            }
            if let Some(caps) = registered.pattern.captures(route) {
                return Some(RouteMatch {
                    handler: &registered.handler,
                    resource_id: caps.get(1).map(|id| id.as_str().to_string()),
                });
            }
        }
        None
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Router::new()
    }
}

fn compile_pattern(pattern: &str) -> Regex {
    let escaped = regex::escape(pattern);
    let compiled = escaped.replace("<id>", r"([a-zA-Z0-9\-_\.\+]+)");
    Regex::new(&format!("^{}$", compiled)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/posts/"), ("/posts".to_string(), ResponseFormat::Json));
        assert_eq!(normalize_path("posts"), ("/posts".to_string(), ResponseFormat::Json));
        assert_eq!(normalize_path("/posts.xml"), ("/posts".to_string(), ResponseFormat::Xml));
        assert_eq!(normalize_path("/posts.json"), ("/posts".to_string(), ResponseFormat::Json));
        assert_eq!(normalize_path("/"), ("/".to_string(), ResponseFormat::Json));
    }

    #[test]
    fn test_id_capture() {
        let mut router = Router::new();
        router.register("/posts/<id>", Method::Get, 1);

        let hit = router.find(Method::Get, "/posts/2024-01-01-hello").unwrap();
        assert_eq!(*hit.handler, 1);
        assert_eq!(hit.resource_id.as_deref(), Some("2024-01-01-hello"));

        assert!(router.find(Method::Get, "/posts").is_none());
        assert!(router.find(Method::Get, "/posts/").is_none());
        assert!(router.find(Method::Get, "/posts/a/b").is_none());
    }

    #[test]
    fn test_literal_routes_have_no_capture() {
        let mut router = Router::new();
        router.register("/blog", Method::Get, "blog");
        let hit = router.find(Method::Get, "/blog").unwrap();
        assert_eq!(hit.resource_id, None);
    }

    #[test]
    fn test_method_is_part_of_the_key() {
        let mut router = Router::new();
        router.register("/posts", Method::Get, "list");
        router.register("/posts", Method::Post, "create");

        assert_eq!(*router.find(Method::Get, "/posts").unwrap().handler, "list");
        assert_eq!(*router.find(Method::Post, "/posts").unwrap().handler, "create");
        assert!(router.find(Method::Delete, "/posts").is_none());
    }

    #[test]
    fn test_registration_order_wins() {
        let mut router = Router::new();
        router.register("/posts/<id>", Method::Get, "first");
        router.register("/posts/<id>", Method::Get, "second");
        assert_eq!(*router.find(Method::Get, "/posts/x").unwrap().handler, "first");
    }
}
