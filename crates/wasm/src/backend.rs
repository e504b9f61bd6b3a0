use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo::net::http::Request;
use partial_playground_core::preview::{RenderBackend, RenderError};
use partial_playground_protocol::{RenderRequest, RenderResponse};
use serde::Serialize;
use serde_json::{Map, Value};
use web_sys::{AbortController, Document};

pub const ON_UPDATE_PREVIEW: &str = "onUpdatePreview";
pub const ON_RESET_PREVIEW: &str = "onResetPreview";
pub const ON_CHANGE_PARTIAL: &str = "onChangePartial";

const HANDLER_HEADER: &str = "X-OCTOBER-REQUEST-HANDLER";
const MARKUP_KEY: &str = "partialContentHtml";

/// Body of handlers that only address a partial.
#[derive(Debug, Serialize)]
pub struct PartialSelection<'a> {
    #[serde(rename = "selectedPartial")]
    pub partial: &'a str,
}

/// Decoded handler reply: rendered preview markup and page fragments keyed by
/// the selector whose contents they replace.
#[derive(Debug, Default, PartialEq)]
pub struct HandlerResponse {
    pub markup: Option<String>,
    pub fragments: Vec<(String, String)>,
}

impl HandlerResponse {
    pub fn from_json(object: Map<String, Value>) -> Self {
        let mut response = HandlerResponse::default();
        for (key, value) in object {
            let Value::String(text) = value else {
                continue;
            };
            if key == MARKUP_KEY {
                response.markup = Some(text);
            } else if key.starts_with('#') {
                response.fragments.push((key, text));
            }
        }
        response
    }
}

/// Aborts the wrapped fetch when the future owning it is dropped.
struct AbortOnDrop(AbortController);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Client for the CMS AJAX handlers of the page it was loaded from.
#[derive(Debug, Clone)]
pub struct HandlerClient {
    url: String,
    csrf_token: Option<String>,
}

impl HandlerClient {
    pub fn new(url: impl Into<String>, csrf_token: Option<String>) -> Self {
        Self {
            url: url.into(),
            csrf_token,
        }
    }

    /// Client for the current page; the CSRF token is read from
    /// `meta[name="csrf-token"]`.
    pub fn for_document(document: &Document) -> anyhow::Result<Self> {
        let url = document
            .url()
            .map_err(|_| anyhow::anyhow!("document URL unavailable"))?;
        let csrf_token = document
            .query_selector(r#"meta[name="csrf-token"]"#)
            .ok()
            .flatten()
            .and_then(|meta| meta.get_attribute("content"));
        Ok(Self::new(url, csrf_token))
    }

    /// POST `body` as JSON to `handler`. Dropping the returned future aborts
    /// the request.
    pub fn call<B>(
        &self,
        handler: &'static str,
        body: &B,
    ) -> LocalBoxFuture<'static, Result<HandlerResponse, RenderError>>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body);
        let client = self.clone();
        async move {
            let body = body.map_err(|err| RenderError::Decode(err.to_string()))?;
            let controller =
                AbortController::new().map_err(|_| RenderError::Transport("no AbortController".into()))?;
            let signal = controller.signal();
            let _guard = AbortOnDrop(controller);

            let mut builder = Request::post(&client.url)
                .header(HANDLER_HEADER, handler)
                .header("X-Requested-With", "XMLHttpRequest")
                .header("Accept", "application/json")
                .abort_signal(Some(&signal));
            if let Some(token) = &client.csrf_token {
                builder = builder.header("X-CSRF-TOKEN", token);
            }
            let request = builder
                .json(&body)
                .map_err(|err| RenderError::Transport(err.to_string()))?;

            let response = request
                .send()
                .await
                .map_err(|err| RenderError::Transport(err.to_string()))?;
            if !response.ok() {
                return Err(RenderError::Status {
                    status: response.status(),
                });
            }
            let object: Map<String, Value> = response
                .json()
                .await
                .map_err(|err| RenderError::Decode(err.to_string()))?;
            Ok(HandlerResponse::from_json(object))
        }
        .boxed_local()
    }
}

impl RenderBackend for HandlerClient {
    fn render(
        &self,
        request: RenderRequest,
    ) -> LocalBoxFuture<'static, Result<RenderResponse, RenderError>> {
        self.call(ON_UPDATE_PREVIEW, &request)
            .map(|reply| {
                reply.map(|reply| RenderResponse {
                    html: reply.markup,
                })
            })
            .boxed_local()
    }
}

/// Fetch the text of an external script for revival.
pub async fn fetch_script(src: &str) -> anyhow::Result<String> {
    let response = Request::get(src).send().await?;
    if !response.ok() {
        anyhow::bail!("script {src} responded with status {}", response.status());
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_markup_from_fragments() {
        let Value::Object(object) = json!({
            "partialContentHtml": "<h1>Hi</h1>",
            "#config-content": "<form></form>",
            "#preview-content": "<iframe></iframe>",
            "X_OCTOBER_FLASH": {"success": "ok"},
            "ignored": "text",
        }) else {
            unreachable!()
        };
        let response = HandlerResponse::from_json(object);
        assert_eq!(response.markup.as_deref(), Some("<h1>Hi</h1>"));
        assert_eq!(
            response.fragments,
            [
                ("#config-content".to_string(), "<form></form>".to_string()),
                ("#preview-content".to_string(), "<iframe></iframe>".to_string()),
            ]
        );
    }

    #[test]
    fn selection_body_uses_handler_field_name() {
        let body = serde_json::to_value(PartialSelection { partial: "cards/hero" }).unwrap();
        assert_eq!(body, json!({"selectedPartial": "cards/hero"}));
    }
}
