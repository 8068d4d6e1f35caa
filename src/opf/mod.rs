//! OPF package document: metadata, manifest, spine, and guide.

pub mod collection;
pub mod entry;
pub mod metadata;
pub mod package;

pub use collection::{CollectionEntry, CollectionView};
pub use entry::{GuideReference, ManifestEntry, SpineEntry};
pub use metadata::{Metadata, MetadataMut, MetadataValue};
pub use package::{NCX_MEDIA_TYPE, PackageDocument, PackageTemplate};

/// Mutable view over the manifest
pub type Manifest<'a> = CollectionView<'a, ManifestEntry>;
/// Mutable view over the spine
pub type Spine<'a> = CollectionView<'a, SpineEntry>;
/// Mutable view over the guide
pub type Guide<'a> = CollectionView<'a, GuideReference>;
