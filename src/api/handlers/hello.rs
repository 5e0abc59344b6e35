//! Greeting page

use axum::extract::{Path, State};
use axum::response::Html;
use chrono::Local;

use crate::api::server::AppState;

const INDEX_TEMPLATE: &str = include_str!("../../../templates/index.html");

/// Values substituted into the greeting template
#[derive(Debug, Clone)]
pub struct Welcome {
    pub name: String,
    pub time: String,
    pub user: String,
    pub redis_value: String,
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    render_for(&state, String::new()).await
}

/// `GET /*name`, any path not claimed by another route
pub async fn greet(State(state): State<AppState>, Path(name): Path<String>) -> Html<String> {
    render_for(&state, name).await
}

async fn render_for(state: &AppState, name: String) -> Html<String> {
    let redis = &state.config.redis;
    let redis_value = state
        .store
        .get_or_default(&redis.value_key, &redis.default_value)
        .await;

    let welcome = Welcome {
        name,
        time: Local::now().format("%b %e %H:%M:%S").to_string(),
        user: std::env::var("USER").unwrap_or_default(),
        redis_value,
    };

    Html(render(&welcome))
}

/// Fill the embedded template; every value is HTML-escaped.
///
/// The template is scanned once, so placeholder syntax inside a value is
/// emitted as text and never expanded. Unknown placeholders are kept as-is.
pub fn render(welcome: &Welcome) -> String {
    let mut out = String::with_capacity(INDEX_TEMPLATE.len() + 256);
    let mut rest = INDEX_TEMPLATE;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        match welcome.field(&after[..end]) {
            Some(value) => out.push_str(&escape_html(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

impl Welcome {
    fn field(&self, key: &str) -> Option<&str> {
        match key.trim() {
            "name" => Some(&self.name),
            "time" => Some(&self.time),
            "user" => Some(&self.user),
            "redis_value" => Some(&self.redis_value),
            _ => None,
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{get, memory_state, router, state_with};
    use crate::store::StoreHandle;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_index_renders_welcome() {
        let (state, _store) = memory_state();
        let (status, body) = get(router(state), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome"));
        assert!(body.contains("default_value"));
    }

    #[tokio::test]
    async fn test_greet_uses_path_and_store_value() {
        let (state, store) = memory_state();
        store.set("greeting", "from-redis");

        let (status, body) = get(router(state), "/gopher").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome gopher"));
        assert!(body.contains("from-redis"));
    }

    #[tokio::test]
    async fn test_greet_without_store() {
        let (status, body) = get(router(state_with(StoreHandle::unavailable())), "/ferris").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome ferris"));
        assert!(body.contains("default_value"));
    }

    #[test]
    fn test_render_escapes_values() {
        let html = render(&Welcome {
            name: "<script>".to_string(),
            time: "Jan  2 15:04:05".to_string(),
            user: "a&b".to_string(),
            redis_value: "\"quoted\"".to_string(),
        });

        assert!(html.contains("Welcome &lt;script&gt;"));
        assert!(html.contains("a&amp;b"));
        assert!(html.contains("&#34;quoted&#34;"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_values_are_not_expanded_as_placeholders() {
        let html = render(&Welcome {
            name: "{{redis_value}}".to_string(),
            time: "{{user}}".to_string(),
            user: "ferris".to_string(),
            redis_value: "SECRET".to_string(),
        });

        assert!(html.contains("Welcome {{redis_value}}"));
        assert!(!html.contains("Welcome SECRET"));
        assert_eq!(html.matches("SECRET").count(), 1);
        assert_eq!(html.matches("ferris").count(), 1);
    }

    #[tokio::test]
    async fn test_greet_matches_multi_segment_path() {
        let (state, _) = memory_state();
        let (status, body) = get(router(state), "/a/b").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Welcome a/b"));
    }
}
