/// Cookie Transport
///
/// The auth token travels in a cookie, but the session logic only needs a
/// key/value capability. `CookieStore` is that capability:
/// - `MemoryCookieStore` for tests and non-browser callers
/// - `ResponseCookieJar` for actix-web: reads request cookies and writes
///   `Set-Cookie` headers onto the response

use std::collections::HashMap;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponseBuilder};

use crate::configuration::CookieSettings;

pub trait CookieStore {
    fn set(&mut self, key: &str, value: &str);
    fn get(&self, key: &str) -> Option<String>;
    fn delete(&mut self, key: &str);
    /// Remove every cookie; used by `SessionManager::logout_all`
    fn clear(&mut self);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCookieStore {
    values: HashMap<String, String>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl CookieStore for MemoryCookieStore {
    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Request-scoped cookie view with pending changes.
///
/// `get` sees changes made earlier in the same request. Call `apply` on
/// the response builder to emit them.
pub struct ResponseCookieJar {
    incoming: HashMap<String, String>,
    // None marks a removal
    changes: HashMap<String, Option<String>>,
    settings: CookieSettings,
    max_age: Option<i64>,
}

impl ResponseCookieJar {
    pub fn from_request(req: &HttpRequest, settings: &CookieSettings) -> Self {
        let incoming = match req.cookies() {
            Ok(cookies) => cookies
                .iter()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse request cookies");
                HashMap::new()
            }
        };

        Self {
            incoming,
            changes: HashMap::new(),
            settings: settings.clone(),
            max_age: None,
        }
    }

    /// Persist cookies written through this jar for `seconds`
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Write pending changes as `Set-Cookie` headers
    pub fn apply(self, response: &mut HttpResponseBuilder) {
        for (name, change) in self.changes {
            let mut builder = Cookie::build(name, change.clone().unwrap_or_default())
                .path(self.settings.path.clone())
                .http_only(self.settings.http_only)
                .secure(self.settings.secure)
                .same_site(SameSite::Lax);

            if let (Some(_), Some(seconds)) = (&change, self.max_age) {
                builder = builder.max_age(CookieDuration::seconds(seconds));
            }

            let mut cookie = builder.finish();
            if change.is_none() {
                cookie.make_removal();
            }
            response.cookie(cookie);
        }
    }
}

impl CookieStore for ResponseCookieJar {
    fn set(&mut self, key: &str, value: &str) {
        self.changes.insert(key.to_string(), Some(value.to_string()));
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.changes.get(key) {
            Some(change) => change.clone(),
            None => self.incoming.get(key).cloned(),
        }
    }

    fn delete(&mut self, key: &str) {
        self.changes.insert(key.to_string(), None);
    }

    fn clear(&mut self) {
        let names: Vec<String> = self
            .incoming
            .keys()
            .chain(self.changes.keys())
            .cloned()
            .collect();
        for name in names {
            self.changes.insert(name, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use actix_web::HttpResponse;

    fn settings() -> CookieSettings {
        CookieSettings {
            name: "auth_cookie".to_string(),
            path: "/".to_string(),
            secure: false,
            http_only: true,
        }
    }

    #[test]
    fn test_memory_store_set_get_delete() {
        let mut store = MemoryCookieStore::new();
        store.set("auth_cookie", "token");
        assert_eq!(store.get("auth_cookie"), Some("token".to_string()));

        store.delete("auth_cookie");
        assert_eq!(store.get("auth_cookie"), None);
    }

    #[test]
    fn test_memory_store_clear() {
        let mut store = MemoryCookieStore::new();
        store.set("a", "1");
        store.set("b", "2");
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_jar_reads_request_cookies() {
        let req = TestRequest::default()
            .cookie(Cookie::new("auth_cookie", "abc"))
            .to_http_request();
        let jar = ResponseCookieJar::from_request(&req, &settings());

        assert_eq!(jar.get("auth_cookie"), Some("abc".to_string()));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_jar_pending_changes_shadow_request() {
        let req = TestRequest::default()
            .cookie(Cookie::new("auth_cookie", "abc"))
            .to_http_request();
        let mut jar = ResponseCookieJar::from_request(&req, &settings());

        jar.set("auth_cookie", "new");
        assert_eq!(jar.get("auth_cookie"), Some("new".to_string()));

        jar.delete("auth_cookie");
        assert_eq!(jar.get("auth_cookie"), None);
    }

    #[test]
    fn test_jar_emits_set_cookie_with_attributes() {
        let req = TestRequest::default().to_http_request();
        let mut jar = ResponseCookieJar::from_request(&req, &settings()).with_max_age(3600);
        jar.set("auth_cookie", "token-value");

        let mut builder = HttpResponse::Ok();
        jar.apply(&mut builder);
        let response = builder.finish();

        let cookie = response
            .cookies()
            .find(|c| c.name() == "auth_cookie")
            .expect("cookie not set");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::seconds(3600)));
    }

    #[test]
    fn test_jar_emits_removal() {
        let req = TestRequest::default()
            .cookie(Cookie::new("auth_cookie", "abc"))
            .to_http_request();
        let mut jar = ResponseCookieJar::from_request(&req, &settings());
        jar.delete("auth_cookie");

        let mut builder = HttpResponse::Ok();
        jar.apply(&mut builder);
        let response = builder.finish();

        let cookie = response
            .cookies()
            .find(|c| c.name() == "auth_cookie")
            .expect("removal cookie not set");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }

    #[test]
    fn test_jar_clear_removes_everything() {
        let req = TestRequest::default()
            .cookie(Cookie::new("auth_cookie", "abc"))
            .cookie(Cookie::new("theme", "dark"))
            .to_http_request();
        let mut jar = ResponseCookieJar::from_request(&req, &settings());
        jar.clear();

        assert_eq!(jar.get("auth_cookie"), None);
        assert_eq!(jar.get("theme"), None);
    }
}
