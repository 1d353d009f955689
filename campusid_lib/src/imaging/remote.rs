//! HTTP-backed segmentation and face detection.
//!
//! Both services take the image as a PNG request body. The segmentation
//! service answers with a PNG whose alpha channel is the foreground mask;
//! the detector answers with `{"face": {"x":..,"y":..,"width":..,"height":..}}`
//! or `{"face": null}`.

use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use serde::Deserialize;

use super::transform::{decode, encode_png, FaceBox};
use super::{BackgroundRemover, FaceDetector, ImagingError};

const SERVICE_TIMEOUT: Duration = Duration::from_secs(60);

fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(SERVICE_TIMEOUT).build()
}

async fn post_png(
    client: &reqwest::Client,
    url: &str,
    image: &DynamicImage,
) -> Result<reqwest::Response, String> {
    let body = encode_png(image).map_err(|e| e.to_string())?;
    let resp = client
        .post(url)
        .header("content-type", "image/png")
        .body(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("service returned HTTP {}", status.as_u16()));
    }
    Ok(resp)
}

pub struct RemoteBackgroundRemover {
    client: reqwest::Client,
    url: String,
}

impl RemoteBackgroundRemover {
    pub fn new(url: &str) -> Result<Self, ImagingError> {
        let client =
            build_client().map_err(|e| ImagingError::BackgroundRemoval(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl BackgroundRemover for RemoteBackgroundRemover {
    async fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, ImagingError> {
        let resp = post_png(&self.client, &self.url, image)
            .await
            .map_err(ImagingError::BackgroundRemoval)?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ImagingError::BackgroundRemoval(e.to_string()))?;
        let cutout = decode(&bytes)?;
        Ok(cutout.to_rgba8())
    }
}

#[derive(Deserialize)]
struct FaceResponse {
    face: Option<FaceBox>,
}

pub struct RemoteFaceDetector {
    client: reqwest::Client,
    url: String,
}

impl RemoteFaceDetector {
    pub fn new(url: &str) -> Result<Self, ImagingError> {
        let client = build_client().map_err(|e| ImagingError::FaceDetection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FaceDetector for RemoteFaceDetector {
    async fn detect_face(&self, image: &DynamicImage) -> Result<Option<FaceBox>, ImagingError> {
        let resp = post_png(&self.client, &self.url, image)
            .await
            .map_err(ImagingError::FaceDetection)?;
        let parsed: FaceResponse = resp
            .json()
            .await
            .map_err(|e| ImagingError::FaceDetection(e.to_string()))?;
        Ok(parsed.face)
    }
}
