//! OAuth 1.0 tokens and HMAC-SHA1 request signing (RFC 5849).

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::fmt;
use url::Url;
use uuid::Uuid;

use cloudfile_common::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// RFC 5849 section 3.6: everything but unreserved characters is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// An OAuth token and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    pub secret: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("token", &self.token)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Short-lived token, only valid while authorizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken(pub TokenPair);

/// Long-lived token used to sign API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(pub TokenPair);

/// Application (consumer) credentials.
#[derive(Clone)]
pub struct Consumer {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// RFC 5849 percent-encoding (uppercase hex, unreserved chars kept).
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

fn generate_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

fn generate_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Build the signature base string and sign it with HMAC-SHA1.
///
/// `params` must already contain every oauth_* parameter plus the request's
/// query parameters.
fn sign(
    method: &str,
    url: &Url,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let mut base_url = url.clone();
    base_url.set_query(None);
    base_url.set_fragment(None);

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url.as_str()),
        percent_encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| Error::Authentication(format!("Invalid signing key: {}", e)))?;
    mac.update(base_string.as_bytes());

    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Build an `Authorization: OAuth ...` header value.
///
/// `token` is `None` only while fetching a request token. `extra` holds
/// oauth_* protocol parameters such as `oauth_callback`; query parameters
/// of `url` are folded into the signature automatically.
pub fn authorization_header(
    method: &str,
    url: &Url,
    consumer: &Consumer,
    token: Option<&TokenPair>,
    extra: &[(&str, &str)],
) -> Result<String> {
    let mut oauth_params: Vec<(String, String)> = vec![
        ("oauth_consumer_key".to_string(), consumer.key.clone()),
        ("oauth_nonce".to_string(), generate_nonce()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), generate_timestamp()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ];
    if let Some(token) = token {
        oauth_params.push(("oauth_token".to_string(), token.token.clone()));
    }
    for (k, v) in extra {
        oauth_params.push((k.to_string(), v.to_string()));
    }

    let mut signed_params = oauth_params.clone();
    signed_params.extend(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())));

    let token_secret = token.map(|t| t.secret.as_str()).unwrap_or("");
    let signature = sign(method, url, &signed_params, &consumer.secret, token_secret)?;
    oauth_params.push(("oauth_signature".to_string(), signature));
    oauth_params.sort();

    let fields = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}

/// Parse an `oauth_token=...&oauth_token_secret=...` response body.
///
/// # Errors
/// - Either key is missing or empty
pub fn parse_token_response(body: &str) -> Result<TokenPair> {
    let mut token = None;
    let mut secret = None;

    for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }

    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Authentication("Missing oauth_token in response".to_string()))?;
    let secret = secret.filter(|s| !s.is_empty()).ok_or_else(|| {
        Error::Authentication("Missing oauth_token_secret in response".to_string())
    })?;

    Ok(TokenPair { token, secret })
}
