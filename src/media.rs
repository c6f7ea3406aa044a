use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::{CatalogError, Result};

pub const MAX_IMAGE_BYTES: u64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Accepted extensions: png, jpeg, jpg, webp.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }
}

/// An image that passed the local format and size checks.
#[derive(Debug)]
pub struct ImageFile {
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl ImageFile {
    pub fn read(path: &Path) -> Result<Self> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| {
                CatalogError::UploadFailed(format!(
                    "{} is not a png, jpeg, jpg or webp file",
                    path.display()
                ))
            })?;
        let size = std::fs::metadata(path)
            .map_err(|e| CatalogError::UploadFailed(format!("{}: {}", path.display(), e)))?
            .len();
        check_size(size)?;
        let bytes = std::fs::read(path)
            .map_err(|e| CatalogError::UploadFailed(format!("{}: {}", path.display(), e)))?;
        Self::new(format, bytes)
    }

    pub fn new(format: ImageFormat, bytes: Vec<u8>) -> Result<Self> {
        check_size(bytes.len() as u64)?;
        Ok(ImageFile { format, bytes })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime(), STANDARD.encode(&self.bytes))
    }
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_IMAGE_BYTES {
        return Err(CatalogError::UploadFailed(format!(
            "image is {} bytes, limit is {}",
            size, MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

/// Unsigned upload client for the Cloudinary image host.
pub struct CloudinaryUploader {
    client: Client,
    upload_url: String,
    upload_preset: String,
    folder: String,
}

impl CloudinaryUploader {
    pub fn new(api_base: &str, cloud_name: &str, upload_preset: &str, folder: &str) -> Self {
        CloudinaryUploader {
            client: Client::new(),
            upload_url: format!(
                "{}/v1_1/{}/image/upload",
                api_base.trim_end_matches('/'),
                cloud_name
            ),
            upload_preset: upload_preset.to_string(),
            folder: folder.to_string(),
        }
    }

    /// Upload one image and return its stable https URL.
    pub async fn upload(&self, image: &ImageFile) -> Result<String> {
        let form = [
            ("file", image.data_uri()),
            ("upload_preset", self.upload_preset.clone()),
            ("folder", self.folder.clone()),
        ];
        let resp = self
            .client
            .post(&self.upload_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| upload_failed(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| upload_failed(e.to_string()))?;
        if !status.is_success() {
            return Err(upload_failed(format!("image host responded {}: {}", status, body)));
        }

        let parsed: UploadResponse =
            serde_json::from_str(&body).map_err(|e| upload_failed(e.to_string()))?;
        match parsed.secure_url.filter(|u| !u.is_empty()) {
            Some(url) => {
                info!(url = %url, "Uploaded image");
                Ok(url)
            }
            None => Err(upload_failed("no secure_url in upload response".into())),
        }
    }
}

fn upload_failed(msg: String) -> CatalogError {
    error!("Image upload failed: {}", msg);
    CatalogError::UploadFailed(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn oversized_images_are_refused() {
        let err = ImageFile::new(ImageFormat::Png, vec![0; MAX_IMAGE_BYTES as usize + 1]).unwrap_err();
        assert!(matches!(err, CatalogError::UploadFailed(_)));
        assert!(ImageFile::new(ImageFormat::Png, vec![0; 16]).is_ok());
    }

    #[test]
    fn read_rejects_unknown_formats() {
        let dir = tempfile::tempdir().unwrap();
        let gif = dir.path().join("leaf.gif");
        std::fs::write(&gif, b"GIF89a").unwrap();
        assert!(matches!(ImageFile::read(&gif), Err(CatalogError::UploadFailed(_))));

        let png = dir.path().join("leaf.PNG");
        std::fs::write(&png, [0x89, b'P', b'N', b'G']).unwrap();
        let image = ImageFile::read(&png).unwrap();
        assert_eq!(image.data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("upload_preset=plants-unsigned"))
            .and(body_string_contains("folder=plants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.cloudinary.com/demo/image/upload/plants/tulsi.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::new(&server.uri(), "demo", "plants-unsigned", "plants");
        let image = ImageFile::new(ImageFormat::Png, vec![1, 2, 3]).unwrap();
        let url = uploader.upload(&image).await.unwrap();
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/plants/tulsi.png");
    }

    #[tokio::test]
    async fn response_without_url_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "public_id": "x" })))
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::new(&server.uri(), "demo", "preset", "plants");
        let image = ImageFile::new(ImageFormat::Jpeg, vec![1]).unwrap();
        assert!(matches!(
            uploader.upload(&image).await,
            Err(CatalogError::UploadFailed(_))
        ));
    }

    #[tokio::test]
    async fn host_error_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Upload preset not found"))
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::new(&server.uri(), "demo", "missing", "plants");
        let image = ImageFile::new(ImageFormat::Webp, vec![1]).unwrap();
        let err = uploader.upload(&image).await.unwrap_err();
        assert!(err.to_string().contains("Upload preset not found"));
    }
}
