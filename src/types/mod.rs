// ABOUTME: Validated domain types for repositories, tags and image references.
// ABOUTME: Each type checks registry naming rules at construction time.

mod image_name;
mod image_ref;
mod image_tag;
mod region;
mod repository_name;

pub use image_name::{ImageName, ImageNameError};
pub use image_ref::{ImageRef, ParseImageRefError, RegistryHost};
pub use image_tag::{ImageTag, ImageTagError};
pub use region::{Region, RegionError};
pub use repository_name::{RepositoryName, RepositoryNameError};
