//! Message - the outbound payload handed to every broadcaster

use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// Outbound message
///
/// Immutable once built. Images live behind an `Arc` so a message can be
/// cloned into each worker task without copying pixel data.
#[derive(Clone, Default)]
pub struct Message {
    /// Short title
    pub title: String,

    /// Message body
    pub body: String,

    /// Decoded raster images, in attachment order
    pub images: Arc<[DynamicImage]>,
}

impl Message {
    /// Create a text-only message
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            images: Arc::from(Vec::new()),
        }
    }

    /// Attach images, replacing any already present
    pub fn with_images(mut self, images: Vec<DynamicImage>) -> Self {
        self.images = Arc::from(images);
        self
    }

    /// Whether any image is attached
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("title", &self.title)
            .field("body", &self.body)
            .field("images", &self.images.len())
            .finish()
    }
}
