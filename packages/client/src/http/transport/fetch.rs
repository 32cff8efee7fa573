use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::{HttpTransport, StatusText, TransportBody, TransportRequest, TransportResponse};
use crate::binary::{boxed, collect_stream};
use crate::error::{self, Result};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = fetch)]
    fn global_fetch(input: &web_sys::Request) -> Promise;
}

/// Aborts the in-flight fetch when dropped unless disarmed.
struct AbortGuard {
    ctrl: Option<web_sys::AbortController>,
}

impl AbortGuard {
    fn new() -> Result<Self> {
        let ctrl = web_sys::AbortController::new().map_err(error::js)?;
        Ok(AbortGuard { ctrl: Some(ctrl) })
    }

    fn signal(&self) -> Option<web_sys::AbortSignal> {
        self.ctrl.as_ref().map(web_sys::AbortController::signal)
    }

    fn disarm(mut self) {
        self.ctrl = None;
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        if let Some(ctrl) = self.ctrl.take() {
            ctrl.abort();
        }
    }
}

/// Transport backed by the host `fetch` function.
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    _private: (),
}

impl FetchTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl HttpTransport for FetchTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let init = web_sys::RequestInit::new();
        init.set_method(method.as_str());

        let js_headers = web_sys::Headers::new().map_err(error::js)?;
        for (name, value) in &headers {
            let value = value.to_str().map_err(error::builder)?;
            js_headers.append(name.as_str(), value).map_err(error::js)?;
        }
        init.set_headers(&js_headers.into());

        // fetch upload streaming is not portable; streams are buffered first.
        let payload = match body {
            TransportBody::Empty => None,
            TransportBody::Full(bytes) => Some(bytes),
            TransportBody::Stream { stream, .. } => Some(collect_stream(stream).await?),
        };
        if let Some(payload) = payload.filter(|p| !p.is_empty()) {
            let array = Uint8Array::from(payload.as_ref());
            init.set_body(&array.into());
        }

        let guard = AbortGuard::new()?;
        init.set_signal(guard.signal().as_ref());

        let js_request = web_sys::Request::new_with_str_and_init(url.as_str(), &init).map_err(error::js)?;
        let response: web_sys::Response = JsFuture::from(global_fetch(&js_request))
            .await
            .map_err(|e| error::connect(error::JsFailure::from(e)).with_url(url.clone()))?
            .dyn_into()
            .map_err(error::js)?;

        let mut builder = http::Response::builder().status(response.status());
        if let Some(iter) = js_sys::try_iter(response.headers().as_ref()).map_err(error::js)? {
            for entry in iter {
                let entry: Array = entry.map_err(error::js)?.dyn_into().map_err(error::js)?;
                let (Some(name), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) else {
                    continue;
                };
                if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
                    builder = builder.header(name, value);
                }
            }
        }
        builder = builder.extension(StatusText(response.status_text()));

        let buffer = JsFuture::from(response.array_buffer().map_err(error::js)?)
            .await
            .map_err(|e| error::transport(error::JsFailure::from(e)).with_url(url.clone()))?;
        guard.disarm();

        let bytes = Bytes::from(Uint8Array::new(&buffer).to_vec());
        let stream = boxed(futures::stream::iter([Ok(bytes)]));
        builder.body(stream).map_err(error::transport)
    }
}
