use std::sync::Arc;

use printpdf::image_crate::{self, imageops::FilterType, DynamicImage, ImageError};

use crate::features::reports::models::MaintenanceImage;
use crate::features::reports::services::grouping::CategoryGroups;
use crate::features::reports::services::renderer::RenderSection;
use crate::modules::images::ImageFetcher;

/// Downloads and decodes the photos of a report, one at a time.
///
/// A photo that cannot be fetched or decoded becomes `None` and is rendered
/// as a placeholder.
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    max_edge_px: u32,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, max_edge_px: u32) -> Self {
        Self {
            fetcher,
            max_edge_px,
        }
    }

    pub async fn load_sections(&self, groups: &CategoryGroups) -> Vec<RenderSection> {
        let mut sections = Vec::with_capacity(groups.len());

        for group in groups.iter() {
            let mut images = Vec::with_capacity(group.images.len());
            for image in &group.images {
                images.push(self.load(image).await);
            }

            sections.push(RenderSection {
                heading: group.category.heading().to_string(),
                images,
            });
        }

        sections
    }

    async fn load(&self, image: &MaintenanceImage) -> Option<DynamicImage> {
        let bytes = match self.fetcher.fetch(&image.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(image_id = %image.id, "Photo unavailable: {}", e);
                return None;
            }
        };

        match decode_image(&bytes, self.max_edge_px) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(image_id = %image.id, "Photo could not be decoded: {}", e);
                None
            }
        }
    }
}

/// Decode, shrink to `max_edge_px` on the long edge and flatten to RGB.
pub fn decode_image(bytes: &[u8], max_edge_px: u32) -> Result<DynamicImage, ImageError> {
    let image = image_crate::load_from_memory(bytes)?;

    let image = if image.width() > max_edge_px || image.height() > max_edge_px {
        image.resize(max_edge_px, max_edge_px, FilterType::Triangle)
    } else {
        image
    };

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}
