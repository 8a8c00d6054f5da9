#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use dancefloor_api::{app, load_from_str, resolve, AppState, MemoryDocumentStore, ResolvedModel};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const INTERNAL_TOKEN: &str = "s3cret";
pub const BODY_LIMIT: usize = 64 * 1024;

pub const RESOURCES: &str = r#"{
  "resources": [
    {
      "name": "events",
      "allowed_roles": ["organizer", "admin"],
      "projection": { "secretNote": "exclude" },
      "fields": [
        { "name": "title", "kind": { "type": "text" }, "required": true },
        { "name": "type", "kind": { "type": "select", "options": ["festival", "social"] } },
        { "name": "price", "kind": { "type": "number" }, "rules": { "minimum": 0 } },
        { "name": "published", "kind": { "type": "boolean" } },
        { "name": "styles", "kind": { "type": "multi_select", "options": ["salsa", "bachata"] } },
        { "name": "organizerId", "kind": { "type": "relation", "resource": "users" } },
        { "name": "description", "kind": { "type": "text" } },
        { "name": "secretNote", "kind": { "type": "text" } },
        {
          "name": "venue",
          "kind": { "type": "object", "fields": [
            { "name": "name", "kind": { "type": "text" } },
            { "name": "city", "kind": { "type": "text" } }
          ] }
        }
      ]
    },
    { "name": "users", "requires_auth": false },
    {
      "name": "socials",
      "policy": "owner_scoped",
      "owner_field": "organizerId",
      "protect_reads": true
    },
    {
      "name": "jobs",
      "allowed_roles": ["admin"],
      "expose_internal_call": true
    }
  ]
}"#;

pub fn model() -> ResolvedModel {
    resolve(&load_from_str(RESOURCES).unwrap()).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryDocumentStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(model())
    }

    pub fn with_model(model: ResolvedModel) -> Self {
        let store = MemoryDocumentStore::new();
        let state = AppState::new(Arc::new(store.clone()), model)
            .with_internal_call_token(Some(INTERNAL_TOKEN.to_string()));
        TestApp {
            router: app(state, BODY_LIMIT),
            store,
        }
    }

    pub async fn call(&self, req: TestRequest) -> (StatusCode, Value) {
        let res = self.router.clone().oneshot(req.build()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(&'static str, String)>,
    body: Option<Value>,
    raw: Option<(String, Option<&'static str>)>,
}

impl TestRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        TestRequest {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: None,
            raw: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, uri).json(body)
    }

    pub fn patch(uri: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, uri).json(body)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Body sent verbatim, with an optional content type.
    pub fn raw(mut self, body: impl Into<String>, content_type: Option<&'static str>) -> Self {
        self.raw = Some((body.into(), content_type));
        self
    }

    pub fn as_user(mut self, id: &str, role: &str) -> Self {
        self.headers.push(("x-user-id", id.to_string()));
        self.headers.push(("x-user-role", role.to_string()));
        self
    }

    pub fn internal(mut self, token: &str) -> Self {
        self.headers.push(("x-internal-call", token.to_string()));
        self
    }

    fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        if let Some((body, content_type)) = self.raw {
            if let Some(ct) = content_type {
                builder = builder.header(header::CONTENT_TYPE, ct);
            }
            return builder.body(Body::from(body)).unwrap();
        }
        match self.body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}
