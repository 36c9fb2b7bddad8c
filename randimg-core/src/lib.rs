//! randimg core - random image sources
//!
//! This crate provides the clients the randimg server uses to obtain candidate
//! images from an external random image API.
//!
//! # Example
//!
//! ```no_run
//! use randimg_core::{GiphyClient, GiphyConfig, RandomImageSource};
//!
//! # async fn example() -> randimg_core::Result<()> {
//! let client = GiphyClient::with_config(GiphyConfig {
//!     api_key: "my-api-key".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let image = client.fetch_random().await?;
//! println!("{} -> {}", image.id, image.image_url);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod source;

pub use error::{Result, SourceError};
pub use source::{GiphyClient, GiphyConfig, MockImageSource, RandomImage, RandomImageSource};
