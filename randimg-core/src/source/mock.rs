//! Mock image source for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{RandomImage, RandomImageSource};
use crate::error::{Result, SourceError};

enum Script {
    /// Hand out images in order, repeating the last one when exhausted.
    Images(Vec<RandomImage>),
    /// Fail every call.
    Failure(String),
}

/// Mock source returning scripted images.
/// WARNING: Do not use in production - ids repeat by construction!
pub struct MockImageSource {
    script: Script,
    calls: AtomicUsize,
}

impl MockImageSource {
    /// Source returning the given images in order, then repeating the last one.
    ///
    /// An empty list behaves like [`MockImageSource::failing`].
    pub fn sequence(images: Vec<RandomImage>) -> Self {
        let script = if images.is_empty() {
            Script::Failure("mock source has no images".to_string())
        } else {
            Script::Images(images)
        };
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Source returning the same image on every call.
    pub fn repeating(image: RandomImage) -> Self {
        Self::sequence(vec![image])
    }

    /// Source failing every call with [`SourceError::Unavailable`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Failure(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch_random` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Build a descriptor whose URLs are derived from `id`.
    pub fn image(id: &str) -> RandomImage {
        RandomImage {
            id: id.to_string(),
            title: Some(format!("mock image {id}")),
            url: format!("https://giphy.com/gifs/{id}"),
            image_url: format!("https://media.giphy.com/media/{id}/giphy.gif"),
        }
    }
}

impl Default for MockImageSource {
    fn default() -> Self {
        Self::repeating(Self::image("mock"))
    }
}

#[async_trait]
impl RandomImageSource for MockImageSource {
    async fn fetch_random(&self) -> Result<RandomImage> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Images(images) => Ok(images[call.min(images.len() - 1)].clone()),
            Script::Failure(message) => Err(SourceError::Unavailable(message.clone())),
        }
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}
