pub mod catalog;
pub mod disk;

pub use catalog::Registry;
pub use disk::{ArtifactResolver, DescriptorScanner, FileArtifactResolver};
