//! Verb and response-shape shortcuts over [`HttpClient::request`]

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::HttpClient;
use crate::binary::{BinaryData, ByteStream};
use crate::error::Result;
use crate::http::request::{RequestOptions, ResponseMode};
use crate::http::response::ResponseEnvelope;

impl HttpClient {
    #[inline]
    pub async fn get(&self, target: &str) -> Result<ResponseEnvelope> {
        self.request(target, RequestOptions::get()).await
    }

    /// GET and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        self.request(target, RequestOptions::get()).await?.json()
    }

    pub async fn get_text(&self, target: &str) -> Result<String> {
        self.request(target, RequestOptions::get().response_mode(ResponseMode::Text))
            .await?
            .text()
    }

    pub async fn get_bytes(&self, target: &str) -> Result<BinaryData> {
        self.request(target, RequestOptions::get().response_mode(ResponseMode::Bytes))
            .await?
            .bytes()
    }

    /// GET and hand over the unread body.
    pub async fn get_stream(&self, target: &str) -> Result<ByteStream> {
        self.request(target, RequestOptions::get().response_mode(ResponseMode::Stream))
            .await?
            .into_stream()
    }

    pub async fn post_json<B, T>(&self, target: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(target, RequestOptions::post().json(body)).await?.json()
    }

    pub async fn put_json<B, T>(&self, target: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(target, RequestOptions::put().json(body)).await?.json()
    }

    pub async fn patch_json<B, T>(&self, target: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(target, RequestOptions::patch().json(body)).await?.json()
    }

    #[inline]
    pub async fn delete(&self, target: &str) -> Result<ResponseEnvelope> {
        self.request(target, RequestOptions::delete()).await
    }

    /// HEAD request. The envelope carries headers and an empty body.
    #[inline]
    pub async fn head(&self, target: &str) -> Result<ResponseEnvelope> {
        self.request(
            target,
            RequestOptions::new(http::Method::HEAD).response_mode(ResponseMode::Bytes),
        )
        .await
    }
}
