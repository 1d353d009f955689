//! ID photo preparation: background removal → white compositing →
//! face-centered fill-and-center-crop → compression.
//!
//! Segmentation and face detection are external capabilities behind
//! [`BackgroundRemover`] and [`FaceDetector`]; everything else is plain
//! raster work done on the blocking pool.

mod error;
mod remote;
pub mod signature;
pub mod transform;

use std::sync::Arc;

use async_trait::async_trait;
use campusid_api::types::NamedImage;
use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::Instrument;

use crate::notify::Notification;

pub use error::ImagingError;
pub use remote::{RemoteBackgroundRemover, RemoteFaceDetector};
pub use signature::{normalize_signature, Point, SignaturePad};
pub use transform::{CropRegion, FaceBox, TargetSize, PHOTO_SIZE, SIGNATURE_SIZE};

use transform::{
    composite_on_white, decode, encode_jpeg, face_crop_region, fill_and_center_crop,
    quality_for_size, COMPRESSION_THRESHOLD, STANDARD_QUALITY,
};

/// Produces a copy of the image whose background is transparent.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, ImagingError>;
}

/// Locates a single face, if any.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect_face(&self, image: &DynamicImage) -> Result<Option<FaceBox>, ImagingError>;
}

/// Keeps the source's own alpha channel. For photos that were cut out
/// beforehand, or when no segmentation service is configured.
pub struct AlphaPassthrough;

#[async_trait]
impl BackgroundRemover for AlphaPassthrough {
    async fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage, ImagingError> {
        Ok(image.to_rgba8())
    }
}

/// Never finds a face; the whole image becomes the crop source.
pub struct NoFaceDetector;

#[async_trait]
impl FaceDetector for NoFaceDetector {
    async fn detect_face(&self, _image: &DynamicImage) -> Result<Option<FaceBox>, ImagingError> {
        Ok(None)
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub image: NamedImage,
    pub width: u32,
    pub height: u32,
    /// JPEG quality of the final encode.
    pub quality: u8,
    pub face: Option<FaceBox>,
}

pub(crate) fn require_id_number(id_number: Option<&str>) -> Result<&str, ImagingError> {
    id_number
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ImagingError::MissingIdNumber)
}

pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ImagingError>
where
    F: FnOnce() -> Result<T, ImagingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ImagingError::Task(e.to_string()))?
}

/// The four-stage ID photo pipeline.
#[derive(Clone)]
pub struct PhotoPipeline {
    remover: Arc<dyn BackgroundRemover>,
    detector: Arc<dyn FaceDetector>,
    target: TargetSize,
    compression_threshold: usize,
}

impl PhotoPipeline {
    pub fn new(remover: Arc<dyn BackgroundRemover>, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            remover,
            detector,
            target: PHOTO_SIZE,
            compression_threshold: COMPRESSION_THRESHOLD,
        }
    }

    pub fn with_target(mut self, target: TargetSize) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> TargetSize {
        self.target
    }

    /// Size in bytes above which the framed result is re-encoded at the
    /// compressed quality. Defaults to 2 MiB, which a 320×378 frame at
    /// quality 95 does not reach in practice.
    pub fn with_compression_threshold(mut self, bytes: usize) -> Self {
        self.compression_threshold = bytes;
        self
    }

    /// Runs every stage on `bytes`; the output is named `<id_number>.jpg`.
    pub async fn prepare(
        &self,
        bytes: &[u8],
        id_number: Option<&str>,
    ) -> Result<PreparedImage, ImagingError> {
        let id_number = require_id_number(id_number)?.to_string();
        let span = tracing::info_span!("imaging.prepare", id_number = %id_number);
        self.run(bytes.to_vec(), id_number).instrument(span).await
    }

    async fn run(&self, bytes: Vec<u8>, id_number: String) -> Result<PreparedImage, ImagingError> {
        let source = run_blocking(move || decode(&bytes)).await?;
        tracing::debug!("decoded {}x{} source", source.width(), source.height());

        let cutout = self.remover.remove_background(&source).await?;

        let flattened = run_blocking(move || {
            let rgb = composite_on_white(&cutout);
            let jpeg = encode_jpeg(&rgb, STANDARD_QUALITY)?;
            decode(&jpeg)
        })
        .await?;

        let face = self.detector.detect_face(&flattened).await?;
        if face.is_none() {
            tracing::debug!("no face found, framing the whole image");
        }

        let target = self.target;
        let threshold = self.compression_threshold;
        run_blocking(move || {
            let (width, height) = flattened.dimensions();
            let region = face_crop_region(width, height, face);
            let framed = fill_and_center_crop(&flattened.to_rgb8(), region, target);

            let intermediate = encode_jpeg(&framed, STANDARD_QUALITY)?;
            let quality = quality_for_size(intermediate.len(), threshold);
            let bytes = if quality == STANDARD_QUALITY {
                intermediate
            } else {
                encode_jpeg(&framed, quality)?
            };

            Ok(PreparedImage {
                image: NamedImage::jpeg(format!("{}.jpg", id_number), bytes),
                width: target.width,
                height: target.height,
                quality,
                face,
            })
        })
        .await
    }
}

/// The pending photo of a form: set by a successful pipeline run, cleared
/// by any failure so the user has to start over.
pub struct PhotoSlot {
    pipeline: PhotoPipeline,
    pending: Option<PreparedImage>,
}

impl PhotoSlot {
    pub fn new(pipeline: PhotoPipeline) -> Self {
        Self {
            pipeline,
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<&PreparedImage> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<PreparedImage> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Processes a newly chosen photo and reports the result as a notification.
    pub async fn select(&mut self, bytes: &[u8], id_number: Option<&str>) -> Notification {
        self.pending = None;
        match self.pipeline.prepare(bytes, id_number).await {
            Ok(prepared) => {
                self.pending = Some(prepared);
                Notification::success("Photo processed successfully.")
            }
            Err(e) => {
                tracing::error!("Photo preparation failed: {}", e);
                Notification::error(format!("Could not process the photo: {}", e))
            }
        }
    }
}
