use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Response to a completed call.
///
/// The body is fully buffered and decoding is caller-driven. A non-2xx
/// status is still delivered as a response — including after retry
/// exhaustion — so inspect [`Response::status`] before decoding.
#[derive(Debug)]
pub struct Response {
    inner: http::Response<Bytes>,
}

impl Response {
    pub(crate) fn new(inner: http::Response<Bytes>) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        self.inner.body()
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, ClientError> {
        std::str::from_utf8(self.inner.body())
            .map_err(|err| ClientError::Decode(format!("response body is not utf-8: {err}")))
    }

    /// Decodes a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(self.inner.body())
            .map_err(|err| ClientError::Decode(format!("invalid json response: {err}")))
    }

    /// Decodes an XML body into `T`.
    pub fn xml<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        quick_xml::de::from_str(self.text()?)
            .map_err(|err| ClientError::Decode(format!("invalid xml response: {err}")))
    }

    /// Consumes the handle, returning the owned body.
    pub fn into_bytes(self) -> Bytes {
        self.inner.into_body()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::Deserialize;

    use super::Response;
    use crate::error::ClientError;

    fn response(status: u16, body: &str) -> Response {
        let inner = http::Response::builder()
            .status(status)
            .body(Bytes::copy_from_slice(body.as_bytes()))
            .expect("response must build");
        Response::new(inner)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    #[test]
    fn json_decoding() {
        let resp = response(200, r#"{"id": 1, "name": "kit"}"#);
        let user: User = resp.json().expect("json must decode");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "kit".to_owned()
            }
        );
    }

    #[test]
    fn xml_decoding() {
        let resp = response(200, "<User><id>2</id><name>ada</name></User>");
        let user: User = resp.xml().expect("xml must decode");
        assert_eq!(user.id, 2);
        assert_eq!(user.name, "ada");
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let resp = response(200, "not json");
        let err = resp.json::<User>().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn non_success_status_is_still_a_response() {
        let resp = response(503, "overloaded");
        assert_eq!(resp.status().as_u16(), 503);
        assert_eq!(resp.text().expect("must be utf-8"), "overloaded");
    }
}
