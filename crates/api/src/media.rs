//! Question image URL resolution.
//!
//! Question rows store a bucket-relative `image_path`. Resolution
//! probes the public bucket first and falls back to an HMAC-signed URL
//! with a 30-day expiry when the object is not publicly readable.

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default signed-URL lifetime: 30 days.
const DEFAULT_SIGNED_URL_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Media storage configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Base URL of the public media bucket.
    pub public_base_url: String,
    /// Secret used to sign fallback URLs.
    pub signing_secret: String,
    /// Signed-URL lifetime in seconds (default: 30 days).
    pub signed_url_ttl_secs: i64,
}

impl MediaConfig {
    /// Load media configuration from environment variables.
    ///
    /// | Env Var                    | Default                           |
    /// |----------------------------|-----------------------------------|
    /// | `MEDIA_PUBLIC_BASE_URL`    | `http://localhost:9000/media`     |
    /// | `MEDIA_SIGNING_SECRET`     | `dev-media-signing-secret`        |
    /// | `MEDIA_SIGNED_URL_TTL_SECS`| `2592000`                         |
    pub fn from_env() -> Self {
        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000/media".into());

        let signing_secret = std::env::var("MEDIA_SIGNING_SECRET")
            .unwrap_or_else(|_| "dev-media-signing-secret".into());

        let signed_url_ttl_secs: i64 = std::env::var("MEDIA_SIGNED_URL_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_SIGNED_URL_TTL_SECS.to_string())
            .parse()
            .expect("MEDIA_SIGNED_URL_TTL_SECS must be a valid i64");

        Self {
            public_base_url,
            signing_secret,
            signed_url_ttl_secs,
        }
    }
}

/// Resolves stored image paths to client-fetchable URLs.
pub struct MediaResolver {
    client: Client,
    config: MediaConfig,
}

impl MediaResolver {
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Resolve an image path to a URL.
    ///
    /// Probes the public bucket with a HEAD request; a 2xx answer means
    /// the plain public URL works. Any other status (or a network
    /// failure) falls back to a signed URL.
    pub async fn resolve(&self, image_path: &str) -> String {
        let public_url = self.public_url(image_path);

        match self.client.head(&public_url).send().await {
            Ok(response) if response.status().is_success() => public_url,
            _ => self.signed_url(image_path),
        }
    }

    /// The plain public-bucket URL for a path.
    pub fn public_url(&self, image_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            image_path.trim_start_matches('/')
        )
    }

    /// A signed URL embedding an expiry timestamp and an HMAC-SHA256
    /// signature over `path:expires`.
    pub fn signed_url(&self, image_path: &str) -> String {
        let expires = chrono::Utc::now().timestamp() + self.config.signed_url_ttl_secs;
        let signature = self.sign(image_path, expires);
        format!(
            "{}?expires={expires}&signature={signature}",
            self.public_url(image_path)
        )
    }

    /// Check a signature produced by [`signed_url`](Self::signed_url).
    pub fn verify_signature(&self, image_path: &str, expires: i64, signature: &str) -> bool {
        if expires < chrono::Utc::now().timestamp() {
            return false;
        }
        self.sign(image_path, expires) == signature
    }

    fn sign(&self, image_path: &str, expires: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(self.config.signing_secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(image_path.trim_start_matches('/').as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        hex_encode(&mac.finalize().into_bytes())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
