use std::time::Duration;

use family_night_common::Conf;
use isahc::{
    config::{Configurable as _, RedirectPolicy},
    AsyncReadResponseExt as _, HttpClient, Request,
};

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";
#[cfg(all(target_os = "linux", not(target_arch = "x86_64")))]
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux i686; rv:109.0) Gecko/20100101 Firefox/115.0";

#[cfg(target_os = "windows")]
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0";

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
// Neither Linux nor Windows, so maybe OS X, and if not then OS X is an okay fallback.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/115.0";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream responded with status {status} for `{url}`")]
    Status { url: String, status: u16 },
    #[error("unable to reach upstream for `{url}`")]
    Transport {
        url: String,
        #[source]
        source: isahc::Error,
    },
    #[error("unable to read upstream response for `{url}`")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid upstream url `{url}`")]
    Url {
        url: String,
        #[source]
        source: isahc::http::Error,
    },
}

/// Source of raw advisory pages.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync {
    /// Public page URL for a title, also shown to users as the source link.
    fn page_url(&self, identifier: &str) -> String;

    async fn fetch(&self, identifier: &str) -> Result<String, FetchError>;
}

/// Fetches advisory pages over HTTP, one attempt per call.
pub struct HttpUpstream {
    client: HttpClient,
    template: String,
}

impl HttpUpstream {
    pub fn new(conf: &Conf) -> Result<Self, family_night_common::Report> {
        Self::with_template(&conf.upstream, Duration::from_secs(conf.fetch_timeout))
    }

    pub fn with_template(template: &str, timeout: Duration) -> Result<Self, family_night_common::Report> {
        if !template.contains("{id}") {
            family_night_common::bail!("upstream template `{}` has no `{{id}}` placeholder", template);
        }

        let client = HttpClient::builder()
            .default_header("User-Agent", USER_AGENT)
            .default_header("Accept-Language", "en-US,en;q=0.5")
            .redirect_policy(RedirectPolicy::Follow)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            template: template.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    fn page_url(&self, identifier: &str) -> String {
        self.template.replace("{id}", identifier)
    }

    #[tracing::instrument(skip(self), err)]
    async fn fetch(&self, identifier: &str) -> Result<String, FetchError> {
        let url = self.page_url(identifier);

        tracing::info!(url = %url, "fetching");

        let req = Request::get(url.as_str())
            .body(())
            .map_err(|source| FetchError::Url {
                url: url.clone(),
                source,
            })?;

        let mut res = self
            .client
            .send_async(req)
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        if !res.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: res.status().as_u16(),
            });
        }

        let html = res
            .text()
            .await
            .map_err(|source| FetchError::Body { url, source })?;

        Ok(html)
    }
}
