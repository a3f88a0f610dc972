//! Placer module for copying finished outputs to their destinations.
//!
//! This module provides the `Filesystem` trait, a local implementation and
//! the `SafeRelocator` that places derivatives next to the source image
//! without ever overwriting an existing file.
//!
//! # Features
//!
//! - Exists-rename: `photo.jpg.webp` becomes `photo.jpg_0.webp` on collision
//! - Atomic claim of the chosen name via `create_new`
//! - Replace through a temporary sibling and rename
//! - Automatic parent directory creation
//! - Append-only tracking of every placed artifact
//!
//! # Example
//!
//! ```ignore
//! use optimagick_core::placer::{LocalFilesystem, SafeRelocator, TemporaryFileSet};
//!
//! let relocator = SafeRelocator::new(Arc::new(LocalFilesystem::with_defaults()));
//! let mut tracked = TemporaryFileSet::new();
//!
//! if let Some(placed) = relocator
//!     .relocate(Path::new("/tmp/run/photo.jpg.webp"), Path::new("/srv/photo.jpg.webp"), &mut tracked)
//!     .await
//! {
//!     println!("placed at {:?}", placed);
//! }
//! ```

mod config;
mod error;
mod fs;
mod relocator;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs::LocalFilesystem;
pub use relocator::SafeRelocator;
pub use traits::Filesystem;
pub use types::{exists_rename_candidate, ExistsPolicy, TemporaryFileSet};
