//! Common types shared by the selector and the invocation endpoint.

use std::collections::BTreeMap;

use mime::Mime;
use reqwest::StatusCode;
use serde::Serialize;

/// Header name as the gateway expects it, capitalised.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Image formats the selector can label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageContentType {
    Jpeg,
    Png,
}

impl ImageContentType {
    /// Derive the content type from the textual suffix after a link's last `/`.
    ///
    /// Keys are not percent-encoded, so `#` and `?` belong to the file name.
    /// Unrecognised or missing extensions yield `None`.
    #[must_use]
    pub fn from_link(link: &str) -> Option<Self> {
        let file_name = link.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;

        if extension.eq_ignore_ascii_case("jpeg") || extension.eq_ignore_ascii_case("jpg") {
            Some(ImageContentType::Jpeg)
        } else if extension.eq_ignore_ascii_case("png") {
            Some(ImageContentType::Png)
        } else {
            None
        }
    }

    #[must_use]
    pub fn mime(self) -> Mime {
        match self {
            ImageContentType::Jpeg => mime::IMAGE_JPEG,
            ImageContentType::Png => mime::IMAGE_PNG,
        }
    }
}

/// Response envelope handed back to the invoking gateway.
///
/// A failure serialises to `{"statusCode":400}` with every other field omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
}

impl GatewayResponse {
    /// Successful response carrying a base64 body.
    #[must_use]
    pub fn image(body: String, content_type: Option<ImageContentType>) -> Self {
        let headers = content_type
            .map(|ct| (CONTENT_TYPE_HEADER.to_string(), ct.mime().to_string()))
            .into_iter()
            .collect();

        Self {
            status_code: StatusCode::OK.as_u16(),
            headers: Some(headers),
            body: Some(body),
            is_base64_encoded: Some(true),
        }
    }

    /// Bare failure response: status only.
    #[must_use]
    pub fn failure(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
            headers: None,
            body: None,
            is_base64_encoded: None,
        }
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(CONTENT_TYPE_HEADER))
            .map(String::as_str)
    }
}
