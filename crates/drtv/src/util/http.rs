use std::{ops::Deref, time::Duration};

use fake_user_agent::get_chrome_rua;
use reqwest::{Client, IntoUrl, Proxy, StatusCode};

use crate::error::{DrtvError, DrtvResult};

/// Shared HTTP client for API and media requests.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client with a browser user agent, an optional
    /// `host:port`-style proxy and a connect timeout.
    pub fn new(proxy: Option<&str>, timeout: u64) -> DrtvResult<Self> {
        let mut builder = Client::builder()
            .user_agent(get_chrome_rua())
            .connect_timeout(Duration::from_secs(timeout));

        if let Some(proxy) = proxy {
            log::info!("Setting proxy to {proxy}");
            builder = builder.proxy(Proxy::all(format!("http://{proxy}"))?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent(get_chrome_rua())
                .build()
                .unwrap(),
        }
    }
}

impl Deref for HttpClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Fetches a text resource.
///
/// DR's CDN answers out-of-country requests with HTTP 403, which maps to the
/// distinguished geoblock error; any other non-2xx status fails with
/// [`DrtvError::HttpError`].
pub async fn fetch_text(
    client: &HttpClient,
    url: impl IntoUrl,
    query: Option<&[(&str, &str)]>,
    token: Option<&str>,
) -> DrtvResult<String> {
    let mut request = client.get(url);
    if let Some(query) = query {
        request = request.query(query);
    }
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return Err(DrtvError::Geoblocked);
    }
    if !status.is_success() {
        if let Ok(body) = response.text().await {
            log::warn!("Error body: {body}");
        }
        return Err(DrtvError::HttpError(status));
    }

    Ok(response.text().await?)
}
