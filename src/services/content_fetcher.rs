// Single-GET page fetcher with a bounded body snapshot

use encoding_rs::{DecoderResult, Encoding, UTF_8};
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, Response};
use tracing::{debug, warn};

use crate::{
    app_config::ProbeConfig,
    models::probe::{ProbeError, RawContent},
};

#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: Client,
    max_body_bytes: usize,
    timeout_secs: u64,
}

impl ContentFetcher {
    /// TLS verification is relaxed on purpose: broken certificates are scored
    /// by the TLS probe, they must not hide the page.
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .redirect(Policy::limited(config.fetch_max_redirects))
            .user_agent(config.fetch_user_agent.as_str())
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|e| ProbeError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_body_bytes: config.fetch_max_body_bytes,
            timeout_secs: config.fetch_timeout,
        })
    }

    /// Issue exactly one GET (redirects followed) and keep at most
    /// `max_body_bytes` of the body.
    pub async fn fetch(&self, url: &str) -> Result<RawContent, ProbeError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let charset = declared_charset(&response);

        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;

        while let Some(chunk) = response.chunk().await.map_err(|e| self.map_error(e))? {
            let remaining = self.max_body_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                debug!("Truncated body of {} at {} bytes", url, self.max_body_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        // Dropping the response here closes the connection if the body was cut short
        drop(response);

        let body = decode_body(&body, charset.as_deref(), truncated)?;
        debug!("Fetched {} -> {} ({} bytes)", url, status, body.len());

        Ok(RawContent {
            status,
            body,
            final_url,
            truncated,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            warn!("Fetch timed out after {}s", self.timeout_secs);
            ProbeError::Timeout(self.timeout_secs)
        } else {
            ProbeError::from(err)
        }
    }
}

/// `charset` parameter of the response's Content-Type, if any
fn declared_charset(response: &Response) -> Option<String> {
    let content_type = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

/// Decode the captured bytes with the declared charset, UTF-8 when absent or
/// unknown. A BOM overrides the label. A multi-byte sequence cut by the cap is
/// dropped; any other malformed sequence makes the page undecodable.
pub fn decode_body(
    bytes: &[u8],
    charset: Option<&str>,
    truncated: bool,
) -> Result<String, ProbeError> {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let mut decoder = encoding.new_decoder();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .ok_or_else(|| ProbeError::Decode("body too large to decode".to_string()))?;

    let mut text = String::with_capacity(capacity);
    // A non-final decode keeps an incomplete trailing sequence pending instead of failing
    let (result, read) =
        decoder.decode_to_string_without_replacement(bytes, &mut text, !truncated);

    match result {
        DecoderResult::InputEmpty => Ok(text),
        DecoderResult::Malformed(_, _) => Err(ProbeError::Decode(format!(
            "invalid {} sequence before byte {}",
            encoding.name(),
            read
        ))),
        DecoderResult::OutputFull => {
            Err(ProbeError::Decode("decode buffer exhausted".to_string()))
        },
    }
}
