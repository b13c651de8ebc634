//! Request/response descriptors and the transport seam the gateway decorates.
//!
//! [`HttpTransport`] is the gateway's only dependency on an HTTP stack. The default
//! [`ReqwestTransport`] ships behind the `reqwest` feature; tests and embedders can plug in
//! any implementation that turns a [`GatewayRequest`] into a [`GatewayResponse`] or a
//! [`TransportError`] when no response was received.

// std
use std::borrow::Cow;
#[cfg(feature = "reqwest")] use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Header the gateway owns on every outbound request.
pub const AUTHORIZATION: &str = "authorization";

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<GatewayResponse, TransportError>> + 'a + Send>>;

/// Abstraction over the HTTP stack that performs the actual request/response exchange.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever response the server produced, including
	/// error statuses. Only failures without a response map to [`TransportError`].
	fn execute(&self, request: GatewayRequest) -> TransportFuture<'_>;
}

/// HTTP methods supported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
}
impl Method {
	/// Returns the wire representation.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
			Method::Head => reqwest::Method::HEAD,
		}
	}
}

/// Outbound request descriptor.
///
/// Header names are matched case-insensitively. Requests are immutable from the gateway's
/// point of view: attaching a credential produces a new descriptor so a replay never observes
/// state left behind by the first attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Ordered header list.
	pub headers: Vec<(String, String)>,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl GatewayRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// Shorthand for a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(Method::Post, url)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(url: Url) -> Self {
		Self::new(Method::Put, url)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::Delete, url)
	}

	/// Sets a header, replacing any existing value with the same (case-insensitive) name.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();

		self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
		self.headers.push((name, value.into()));

		self
	}

	/// Sets the raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets the content type.
	pub fn with_json<T>(self, payload: &T) -> serde_json::Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload)?;

		Ok(self.with_header("content-type", "application/json").with_body(body))
	}

	/// Returns the first header value matching `name`.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Returns a copy of this request carrying `token` as its bearer credential.
	///
	/// Without a token the request is returned unchanged and goes out unauthenticated.
	pub fn authorized(&self, token: Option<&TokenSecret>) -> Self {
		match token {
			Some(token) => self.clone().with_header(AUTHORIZATION, token.bearer()),
			None => self.clone(),
		}
	}
}
impl Debug for GatewayRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let shown =
					if name.eq_ignore_ascii_case(AUTHORIZATION) { "<redacted>" } else { value };

				(name.as_str(), shown)
			})
			.collect::<Vec<_>>();

		f.debug_struct("GatewayRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Response received from the transport, passed through to callers unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayResponse {
	/// HTTP status code.
	pub status: u16,
	/// Ordered header list.
	pub headers: Vec<(String, String)>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl GatewayResponse {
	/// Creates a response without headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: Vec::new(), body: body.into() }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns the first header value matching `name`.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// `4xx` and `5xx` statuses.
	pub fn is_error(&self) -> bool {
		self.status >= 400
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Deserializes the JSON body, reporting the failing field path on error.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(existing, _)| existing.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure timeouts on the wrapped client; they surface as [`TransportError::Timeout`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose requests give up after `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}

	async fn exchange(&self, request: GatewayRequest) -> Result<GatewayResponse, TransportError> {
		let mut builder = self.0.request(request.method.into(), request.url);

		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();
		let body = response.bytes().await?.to_vec();

		Ok(GatewayResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: GatewayRequest) -> TransportFuture<'_> {
		Box::pin(self.exchange(request))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url() -> Url {
		Url::parse("https://api.example.com/v1/stations").expect("Fixture URL should parse.")
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn timeout_constructor_builds_a_client() {
		let transport = ReqwestTransport::with_timeout(StdDuration::from_millis(250))
			.expect("Client with a plain timeout should build.");

		assert!(format!("{transport:?}").contains("ReqwestTransport"));
	}

	#[test]
	fn authorized_replaces_existing_authorization_header() {
		let request = GatewayRequest::get(url()).with_header("Authorization", "Basic abc");
		let authorized = request.authorized(Some(&TokenSecret::new("t1")));

		assert_eq!(authorized.header("authorization"), Some("Bearer t1"));
		assert_eq!(authorized.headers.len(), 1);
		assert_eq!(request.header("Authorization"), Some("Basic abc"));
	}

	#[test]
	fn authorized_without_token_leaves_request_untouched() {
		let request = GatewayRequest::get(url()).with_header("accept", "application/json");

		assert_eq!(request.authorized(None), request);
		assert_eq!(request.header(AUTHORIZATION), None);
	}

	#[test]
	fn debug_redacts_authorization() {
		let request = GatewayRequest::get(url()).authorized(Some(&TokenSecret::new("secret-t")));
		let rendered = format!("{request:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("secret-t"));
	}

	#[test]
	fn json_errors_report_field_path() {
		#[derive(Debug, Deserialize)]
		struct Reading {
			#[allow(dead_code)]
			level_cm: u32,
		}

		let response = GatewayResponse::new(200, br#"{"level_cm":"high"}"#.to_vec());
		let err = response.json::<Reading>().expect_err("String level should fail to decode.");

		assert_eq!(err.path().to_string(), "level_cm");
	}

	#[test]
	fn status_helpers_classify_ranges() {
		assert!(GatewayResponse::new(204, Vec::new()).is_success());
		assert!(!GatewayResponse::new(302, Vec::new()).is_error());
		assert!(GatewayResponse::new(404, Vec::new()).is_error());
		assert!(GatewayResponse::new(503, Vec::new()).is_error());
	}
}
