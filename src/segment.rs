// Segmentation collaborator: given a decoded photo, return a same-sized
// image holding only the subject, transparent elsewhere.

use crate::error::Result;
use image::RgbaImage;

pub trait Segmenter: Send + Sync {
    fn extract_foreground(&self, source: &RgbaImage) -> Result<RgbaImage>;
}

#[cfg(feature = "remove-bg")]
pub use remote::RemoveBg;

#[cfg(feature = "remove-bg")]
mod remote {
    use super::Segmenter;
    use crate::config::RemoveBgSettings;
    use crate::error::{Error, Result};
    use crate::export::encode_png;
    use crate::loader::decode_bytes;
    use image::RgbaImage;
    use reqwest::blocking::multipart::{Form, Part};
    use reqwest::blocking::Client;
    use std::time::Duration;

    /// remove.bg HTTP API: multipart `image_file` upload, PNG cutout back.
    pub struct RemoveBg {
        client: Client,
        endpoint: String,
        api_key: String,
    }

    impl RemoveBg {
        pub fn new(
            endpoint: impl Into<String>,
            api_key: impl Into<String>,
            timeout: Duration,
        ) -> Result<Self> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Config(format!("http client: {e}")))?;
            Ok(Self { client, endpoint: endpoint.into(), api_key: api_key.into() })
        }

        /// `None` when no API key is configured anywhere.
        pub fn from_settings(settings: &RemoveBgSettings) -> Result<Option<Self>> {
            let Some(key) = settings.resolve_api_key() else {
                return Ok(None);
            };
            Self::new(&settings.endpoint, key, Duration::from_secs(settings.timeout_secs)).map(Some)
        }
    }

    impl Segmenter for RemoveBg {
        fn extract_foreground(&self, source: &RgbaImage) -> Result<RgbaImage> {
            let png = encode_png(source).map_err(|e| Error::SegmentationFailed(e.to_string()))?;
            let part = Part::bytes(png)
                .file_name("image.png")
                .mime_str("image/png")
                .map_err(|e| Error::SegmentationFailed(e.to_string()))?;

            tracing::info!("requesting cutout from {}", self.endpoint);
            let response = self
                .client
                .post(&self.endpoint)
                .header("X-Api-Key", &self.api_key)
                .multipart(Form::new().part("image_file", part))
                .send()
                .map_err(|e| Error::SegmentationFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(Error::SegmentationFailed(format!(
                    "remove.bg returned {status}: {body}"
                )));
            }
            let bytes = response
                .bytes()
                .map_err(|e| Error::SegmentationFailed(e.to_string()))?;
            decode_bytes(&bytes)
        }
    }
}
