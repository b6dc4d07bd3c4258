//! Upload destinations for a texture.
//!
//! A texture is uploaded to its own backing store and to every atlas it
//! was stitched into, including atlases that are themselves stitched into
//! larger atlases. [`BaseCollection::find`] walks that nesting once, when
//! the texture is built, and records for every destination ("base") where
//! the frame lands, how many mipmap levels to push and which part of the
//! frame to crop.
//!
//! # Example
//!
//! ```
//! use texlayer::base::{BaseCollection, EdgeOffsets, Sprite, TextureLocation};
//! use texlayer::geometry::Point;
//!
//! let texture: TextureLocation = "mymod:lamp".parse().unwrap();
//! let atlas: TextureLocation = "blocks_atlas".parse().unwrap();
//!
//! let finder = |location: &TextureLocation| {
//!     if location.path() == "lamp" {
//!         vec![Sprite::new(atlas.clone(), Point::new(32, 16), 4, EdgeOffsets::default())]
//!     } else {
//!         Vec::new()
//!     }
//! };
//!
//! let bases = BaseCollection::find(&finder, &texture).unwrap();
//! assert_eq!(bases.base_names().count(), 2);
//! assert_eq!(bases.max_mipmap(), 4);
//! ```

mod location;

pub use location::{TextureLocation, DEFAULT_NAMESPACE};

use std::collections::HashMap;

use thiserror::Error;

use crate::geometry::{Point, Rect};

/// Errors raised while resolving texture bases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BaseError {
    /// A location string is not a valid `namespace:path`.
    #[error("invalid texture location '{0}'")]
    InvalidLocation(String),

    /// Nested sprite positions add up past the coordinate range.
    #[error("upload point for atlas {atlas} overflows")]
    UploadPointOverflow { atlas: TextureLocation },
}

/// Pixels trimmed from each edge of a frame before it is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EdgeOffsets {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl EdgeOffsets {
    pub const fn new(left: u32, right: u32, top: u32, bottom: u32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// The part of a `width`×`height` frame left after trimming.
    ///
    /// Offsets larger than the frame leave an empty region.
    pub fn crop(self, width: u32, height: u32) -> Rect {
        Rect::new(
            self.left.min(width),
            self.top.min(height),
            width.saturating_sub(self.left).saturating_sub(self.right),
            height.saturating_sub(self.top).saturating_sub(self.bottom),
        )
    }
}

/// Where a texture was stitched into an atlas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sprite {
    pub atlas: TextureLocation,
    pub upload_point: Point,
    pub mipmap_level: u8,
    pub offsets: EdgeOffsets,
}

impl Sprite {
    pub fn new(atlas: TextureLocation, upload_point: Point, mipmap_level: u8, offsets: EdgeOffsets) -> Self {
        Self {
            atlas,
            upload_point,
            mipmap_level,
            offsets,
        }
    }
}

/// Looks up the atlases a texture or atlas was stitched into.
pub trait SpriteFinder {
    fn find_sprites(&self, location: &TextureLocation) -> Vec<Sprite>;
}

impl<F> SpriteFinder for F
where
    F: Fn(&TextureLocation) -> Vec<Sprite>,
{
    fn find_sprites(&self, location: &TextureLocation) -> Vec<Sprite> {
        self(location)
    }
}

/// One upload into a base: where, how many mipmap levels, and the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MipmappedBase {
    pub upload_point: Point,
    pub mipmap_level: u8,
    pub offsets: EdgeOffsets,
}

impl MipmappedBase {
    /// The texture's upload into its own backing store.
    pub const IDENTITY: MipmappedBase = MipmappedBase {
        upload_point: Point::ORIGIN,
        mipmap_level: 0,
        offsets: EdgeOffsets::new(0, 0, 0, 0),
    };
}

/// Every base a texture uploads to. Immutable once found.
#[derive(Debug, Clone)]
pub struct BaseCollection {
    bases: HashMap<TextureLocation, Vec<MipmappedBase>>,
    max_mipmap: u8,
}

/// One step of the atlas walk.
struct Walk {
    location: TextureLocation,
    offset: Point,
    mipmap: Option<u8>,
    offsets: Option<EdgeOffsets>,
    chain: Vec<TextureLocation>,
}

impl BaseCollection {
    /// Resolve every base of `texture`.
    ///
    /// The texture's own location is always a base at the origin with no
    /// mipmaps. Each sprite found for the texture adds a base on the
    /// sprite's atlas; each sprite found for that atlas adds a base on the
    /// outer atlas at the summed position, and so on. Nested bases keep the
    /// smallest mipmap level along the chain and the innermost crop.
    /// Identical bases on the same location are stored once.
    pub fn find(finder: &impl SpriteFinder, texture: &TextureLocation) -> Result<Self, BaseError> {
        let mut collection = Self {
            bases: HashMap::new(),
            max_mipmap: 0,
        };
        collection.insert(texture.clone(), MipmappedBase::IDENTITY);

        let mut pending = vec![Walk {
            location: texture.clone(),
            offset: Point::ORIGIN,
            mipmap: None,
            offsets: None,
            chain: vec![texture.clone()],
        }];

        while let Some(walk) = pending.pop() {
            for sprite in finder.find_sprites(&walk.location) {
                if walk.chain.contains(&sprite.atlas) {
                    tracing::warn!(
                        texture = %texture,
                        atlas = %sprite.atlas,
                        "Atlas is stitched into itself, ignoring the cycle"
                    );
                    continue;
                }

                let upload_point = walk
                    .offset
                    .checked_add(sprite.upload_point)
                    .ok_or_else(|| BaseError::UploadPointOverflow {
                        atlas: sprite.atlas.clone(),
                    })?;
                let mipmap_level = walk
                    .mipmap
                    .map_or(sprite.mipmap_level, |outer| outer.min(sprite.mipmap_level));
                let offsets = walk.offsets.unwrap_or(sprite.offsets);

                collection.insert(
                    sprite.atlas.clone(),
                    MipmappedBase {
                        upload_point,
                        mipmap_level,
                        offsets,
                    },
                );

                let mut chain = walk.chain.clone();
                chain.push(sprite.atlas.clone());
                pending.push(Walk {
                    location: sprite.atlas,
                    offset: upload_point,
                    mipmap: Some(mipmap_level),
                    offsets: Some(offsets),
                    chain,
                });
            }
        }

        tracing::debug!(
            texture = %texture,
            bases = collection.bases.len(),
            max_mipmap = collection.max_mipmap,
            "Resolved texture bases"
        );

        Ok(collection)
    }

    fn insert(&mut self, location: TextureLocation, base: MipmappedBase) {
        let entries = self.bases.entry(location).or_default();
        if !entries.contains(&base) {
            self.max_mipmap = self.max_mipmap.max(base.mipmap_level);
            entries.push(base);
        }
    }

    /// Every upload registered for `location`; empty when it is not a base.
    pub fn base_data(&self, location: &TextureLocation) -> &[MipmappedBase] {
        self.bases.get(location).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every location this texture uploads to.
    pub fn base_names(&self) -> impl Iterator<Item = &TextureLocation> {
        self.bases.keys()
    }

    /// Highest mipmap level any base needs.
    pub fn max_mipmap(&self) -> u8 {
        self.max_mipmap
    }
}
