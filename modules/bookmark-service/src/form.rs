//! Lenient form field extraction for the bookmark endpoints.
//!
//! Players send fields as query parameters, urlencoded bodies or multipart
//! bodies (`curl -F`). All three are merged; body fields win over query
//! parameters with the same name, and within one source the first occurrence
//! of a repeated field wins. Nothing here rejects a request: fields that
//! cannot be read are simply missing.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, async_trait};
use std::collections::HashMap;
use std::convert::Infallible;

#[derive(Debug, Default, Clone)]
pub struct FormValues(pub HashMap<String, String>);

impl FormValues {
    /// Field value, or `""` when absent.
    pub fn value(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormValues
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let mut values = HashMap::new();

        if let Ok(Query(query)) =
            Query::<Vec<(String, String)>>::from_request_parts(&mut parts, state).await
        {
            insert_first(&mut values, query);
        }

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        let req = Request::from_parts(parts, body);

        let mut body_values = HashMap::new();
        if content_type.starts_with("multipart/form-data") {
            read_multipart(req, state, &mut body_values).await;
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            match Form::<Vec<(String, String)>>::from_request(req, state).await {
                Ok(Form(fields)) => insert_first(&mut body_values, fields),
                Err(e) => log::debug!("[BOOKMARKS] Unreadable form body: {}", e),
            }
        }
        values.extend(body_values);

        Ok(FormValues(values))
    }
}

fn insert_first(values: &mut HashMap<String, String>, pairs: Vec<(String, String)>) {
    for (name, value) in pairs {
        values.entry(name).or_insert(value);
    }
}

async fn read_multipart<S>(req: Request, state: &S, values: &mut HashMap<String, String>)
where
    S: Send + Sync,
{
    let mut multipart = match Multipart::from_request(req, state).await {
        Ok(multipart) => multipart,
        Err(e) => {
            log::debug!("[BOOKMARKS] Unreadable multipart body: {}", e);
            return;
        }
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(name) = field.name().map(str::to_owned) else {
                    continue;
                };
                match field.text().await {
                    Ok(text) => {
                        values.entry(name).or_insert(text);
                    }
                    Err(e) => log::debug!("[BOOKMARKS] Skipping multipart field {}: {}", name, e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                log::debug!("[BOOKMARKS] Multipart body ended early: {}", e);
                break;
            }
        }
    }
}
