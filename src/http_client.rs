use crate::{
    configuration::{MAX_REDIRECTS, REQUEST_TIMEOUT},
    data::{HttpMethod, RequestData, ResponseData},
    error::Error,
};
use async_trait::async_trait;
use hyper::{
    body,
    client::HttpConnector,
    header::{HeaderName, HeaderValue, LOCATION},
    http::uri::{PathAndQuery, Uri},
    Body, Client, HeaderMap, Request, StatusCode,
};
use hyper_tls::HttpsConnector;
use std::{collections::HashMap, fmt::Debug, time::Duration};
use tokio::time;
use tracing::debug;

/// Issues one HTTP request and waits for its whole response.
#[async_trait]
pub trait HttpClient: Debug {
    async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error>;
}

#[derive(Debug)]
pub struct HyperHttpClient {
    client: Client<HttpsConnector<HttpConnector>>,
    max_redirects: usize,
    timeout: Duration,
}

impl HyperHttpClient {
    pub fn new() -> Self {
        Self::with_limits(MAX_REDIRECTS, REQUEST_TIMEOUT)
    }

    pub fn with_limits(max_redirects: usize, timeout: Duration) -> Self {
        Self {
            client: Client::builder().build::<_, Body>(HttpsConnector::new()),
            max_redirects,
            timeout,
        }
    }

    async fn follow_redirects(&self, request_data: &RequestData) -> Result<ResponseData, Error> {
        let mut uri: Uri = request_data
            .url
            .parse()
            .map_err(|_| Error::ParseUriError(request_data.url.clone()))?;
        let mut method = request_data.method;
        let mut body = request_data.body.clone();
        let mut redirects = 0;

        loop {
            let request = Self::build_request(&uri, method, &request_data.headers, body.clone())?;
            let response = self.client.request(request).await?;
            let status = response.status();

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok());

            if let (true, Some(location)) = (status.is_redirection(), location) {
                if redirects == self.max_redirects {
                    return Err(Error::TooManyRedirects(self.max_redirects));
                }
                redirects += 1;

                let next_uri = resolve_location(&uri, location)?;
                debug!("Following {} redirect from {} to {}", status, uri, next_uri);
                uri = next_uri;

                // 307 and 308 repeat the request as is, the other redirects fall back to GET
                if status != StatusCode::TEMPORARY_REDIRECT
                    && status != StatusCode::PERMANENT_REDIRECT
                    && method == HttpMethod::Post
                {
                    method = HttpMethod::Get;
                    body = None;
                }
                continue;
            }

            let status_code = status.as_u16();
            let headers = Self::response_headers(response.headers());
            let body = body::to_bytes(response.into_body()).await?;
            debug!("{} {} answered {} ({} bytes)", method, uri, status_code, body.len());

            return Ok(ResponseData {
                status_code,
                headers,
                body: String::from_utf8_lossy(&body).into(),
            });
        }
    }

    fn build_request(
        uri: &Uri,
        method: HttpMethod,
        headers: &[(String, String)],
        body: Option<String>,
    ) -> Result<Request<Body>, Error> {
        let mut request_builder = Request::builder().uri(uri.clone()).method(method.as_str());

        if let Some(headers_mut) = request_builder.headers_mut() {
            for (name, value) in headers {
                // a redirected POST loses its body, and with it the form content type
                if body.is_none() && name.eq_ignore_ascii_case("content-type") {
                    continue;
                }
                headers_mut.append(
                    HeaderName::from_lowercase(name.to_lowercase().as_bytes())?,
                    HeaderValue::from_str(value)?,
                );
            }
        }

        let body = match body {
            Some(body) => Body::from(body),
            None => Body::empty(),
        };

        Ok(request_builder.body(body)?)
    }

    // header values that aren't visible ASCII are left out
    fn response_headers(header_map: &HeaderMap) -> HashMap<String, String> {
        header_map
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn make_request(&self, request_data: &RequestData) -> Result<ResponseData, Error> {
        time::timeout(self.timeout, self.follow_redirects(request_data))
            .await
            .map_err(|_| Error::Timeout(self.timeout))?
    }
}

impl Default for HyperHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a `Location` header against the URI that answered with it.
pub fn resolve_location(base: &Uri, location: &str) -> Result<Uri, Error> {
    let invalid = || Error::ParseUriError(location.into());

    if location.starts_with("//") {
        let scheme = base.scheme_str().unwrap_or("http");
        return format!("{}:{}", scheme, location).parse().map_err(|_| invalid());
    }

    if !location.starts_with('/') {
        if let Ok(absolute) = location.parse::<Uri>() {
            if absolute.scheme().is_some() {
                return Ok(absolute);
            }
        }
    }

    let path = if location.starts_with('/') {
        location.to_string()
    } else if location.starts_with('?') {
        format!("{}{}", base.path(), location)
    } else {
        let base_path = base.path();
        let directory = match base_path.rfind('/') {
            Some(index) => &base_path[..=index],
            None => "/",
        };
        format!("{}{}", directory, location)
    };

    let mut parts = base.clone().into_parts();
    parts.path_and_query = Some(path.parse::<PathAndQuery>().map_err(|_| invalid())?);

    Uri::from_parts(parts).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(text: &str) -> Uri {
        text.parse().unwrap()
    }

    #[test]
    fn resolves_absolute_location() {
        let resolved = resolve_location(&uri("http://a.com/x/y"), "https://b.com/z?q=1").unwrap();

        assert_eq!(resolved, uri("https://b.com/z?q=1"));
    }

    #[test]
    fn resolves_root_relative_location() {
        let resolved = resolve_location(&uri("http://a.com:8080/x/y?old=1"), "/next?n=2").unwrap();

        assert_eq!(resolved, uri("http://a.com:8080/next?n=2"));
    }

    #[test]
    fn resolves_path_relative_location() {
        let resolved = resolve_location(&uri("http://a.com/books/1/edit"), "show").unwrap();

        assert_eq!(resolved, uri("http://a.com/books/1/show"));
    }

    #[test]
    fn resolves_query_only_location() {
        let resolved =
            resolve_location(&uri("http://a.com/books/1/edit?page=1"), "?page=2").unwrap();

        assert_eq!(resolved, uri("http://a.com/books/1/edit?page=2"));
    }

    #[test]
    fn resolves_scheme_relative_location() {
        let resolved = resolve_location(&uri("https://a.com/x"), "//cdn.a.com/y").unwrap();

        assert_eq!(resolved, uri("https://cdn.a.com/y"));
    }

    #[test]
    fn content_type_is_dropped_without_body() {
        let headers = vec![
            ("Accept".to_string(), "text/html".to_string()),
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
        ];

        let request =
            HyperHttpClient::build_request(&uri("http://a.com/"), HttpMethod::Get, &headers, None)
                .unwrap();
        assert_eq!(request.method(), "GET");
        assert!(request.headers().get("content-type").is_none());
        assert_eq!(request.headers()["accept"], "text/html");

        let request = HyperHttpClient::build_request(
            &uri("http://a.com/"),
            HttpMethod::Post,
            &headers,
            Some("v=1".into()),
        )
        .unwrap();
        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
    }
}
