//! Graphic payload data
//!
//! Payloads are plain data: pixel buffers, recorded metafile actions, vector
//! sources. Nothing here decodes or renders them; the cache only needs their
//! size and a way to write them to a swap file and back.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of graphic behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphicKind {
    /// No payload
    Empty,
    Bitmap,
    Animation,
    Vector,
    Metafile,
    /// A reference to an external resource, never materialised
    ExternalLink,
}

/// Raster bitmap with an uncompressed pixel buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u16,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Zero-filled bitmap of the given geometry
    pub fn new(width: u32, height: u32, bits_per_pixel: u16) -> Self {
        let len = (width as usize * height as usize * bits_per_pixel as usize).div_ceil(8);
        Self {
            width,
            height,
            bits_per_pixel,
            pixels: vec![0; len],
        }
    }

    pub fn size_bytes(&self) -> i64 {
        self.pixels.len() as i64
    }
}

/// Sequence of bitmap frames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub frames: Vec<Bitmap>,
    /// 0 loops forever
    pub loop_count: u32,
}

impl Animation {
    pub fn size_bytes(&self) -> i64 {
        self.frames.iter().map(Bitmap::size_bytes).sum()
    }
}

/// Source formats held as vector graphic data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VectorFormat {
    Svg,
    Emf,
    Wmf,
    Pdf,
}

/// Vector graphic kept as its binary source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorGraphicData {
    pub format: VectorFormat,
    pub source: Vec<u8>,
    /// Page of a multi-page source such as PDF
    pub page_index: Option<i32>,
}

impl VectorGraphicData {
    pub fn new(format: VectorFormat, source: Vec<u8>) -> Self {
        Self {
            format,
            source,
            page_index: None,
        }
    }

    pub fn size_bytes(&self) -> i64 {
        self.source.len() as i64
    }
}

/// Recorded drawing actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafile {
    pub width: u32,
    pub height: u32,
    pub actions: Vec<u8>,
}

impl Metafile {
    pub fn size_bytes(&self) -> i64 {
        self.actions.len() as i64
    }
}

/// Reference to a graphic stored outside the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub url: String,
}

/// Formats an encoded link can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Svg,
    Emf,
    Wmf,
    Pdf,
}

impl LinkFormat {
    /// Vector format the link materialises as, if any
    pub fn vector_format(self) -> Option<VectorFormat> {
        match self {
            LinkFormat::Svg => Some(VectorFormat::Svg),
            LinkFormat::Emf => Some(VectorFormat::Emf),
            LinkFormat::Wmf => Some(VectorFormat::Wmf),
            LinkFormat::Pdf => Some(VectorFormat::Pdf),
            _ => None,
        }
    }
}

/// Original encoded bytes of a graphic, shared between copies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfxLink {
    pub format: LinkFormat,
    pub data: Arc<[u8]>,
}

impl GfxLink {
    pub fn new(format: LinkFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }

    pub fn kind(&self) -> GraphicKind {
        if self.format.vector_format().is_some() {
            GraphicKind::Vector
        } else {
            GraphicKind::Bitmap
        }
    }

    /// Materialise a payload from the link bytes
    pub(crate) fn materialize(&self, page_index: Option<i32>) -> GraphicPayload {
        let bytes = self.data.to_vec();
        match self.format.vector_format() {
            Some(format) => GraphicPayload::Vector(VectorGraphicData {
                format,
                source: bytes,
                page_index,
            }),
            None => GraphicPayload::Encoded(EncodedImage {
                format: self.format,
                data: bytes,
            }),
        }
    }
}

/// Raster data materialised from a link but not decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub format: LinkFormat,
    pub data: Vec<u8>,
}

/// A materialised graphic payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphicPayload {
    Bitmap(Bitmap),
    Animation(Animation),
    Vector(VectorGraphicData),
    Metafile(Metafile),
    Encoded(EncodedImage),
}

impl GraphicPayload {
    pub fn kind(&self) -> GraphicKind {
        match self {
            GraphicPayload::Bitmap(_) | GraphicPayload::Encoded(_) => GraphicKind::Bitmap,
            GraphicPayload::Animation(_) => GraphicKind::Animation,
            GraphicPayload::Vector(_) => GraphicKind::Vector,
            GraphicPayload::Metafile(_) => GraphicKind::Metafile,
        }
    }

    /// Memory footprint of the payload
    pub fn size_bytes(&self) -> i64 {
        match self {
            GraphicPayload::Bitmap(bitmap) => bitmap.size_bytes(),
            GraphicPayload::Animation(animation) => animation.size_bytes(),
            GraphicPayload::Vector(vector) => vector.size_bytes(),
            GraphicPayload::Metafile(metafile) => metafile.size_bytes(),
            GraphicPayload::Encoded(image) => image.data.len() as i64,
        }
    }
}

impl From<Bitmap> for GraphicPayload {
    fn from(bitmap: Bitmap) -> Self {
        GraphicPayload::Bitmap(bitmap)
    }
}

impl From<Animation> for GraphicPayload {
    fn from(animation: Animation) -> Self {
        GraphicPayload::Animation(animation)
    }
}

impl From<VectorGraphicData> for GraphicPayload {
    fn from(vector: VectorGraphicData) -> Self {
        GraphicPayload::Vector(vector)
    }
}

impl From<Metafile> for GraphicPayload {
    fn from(metafile: Metafile) -> Self {
        GraphicPayload::Metafile(metafile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_size() {
        assert_eq!(Bitmap::new(500, 250, 32).size_bytes(), 500_000);
        assert_eq!(Bitmap::new(3, 1, 1).size_bytes(), 1);
        assert_eq!(Bitmap::new(0, 10, 24).size_bytes(), 0);
    }

    #[test]
    fn test_animation_sums_frames() {
        let animation = Animation {
            frames: vec![Bitmap::new(10, 10, 8), Bitmap::new(20, 10, 8)],
            loop_count: 0,
        };
        assert_eq!(animation.size_bytes(), 300);
        assert_eq!(
            GraphicPayload::from(animation).kind(),
            GraphicKind::Animation
        );
    }

    #[test]
    fn test_link_materializes_by_format() {
        let svg = GfxLink::new(LinkFormat::Svg, vec![1u8, 2, 3]);
        assert_eq!(svg.kind(), GraphicKind::Vector);
        match svg.materialize(Some(2)) {
            GraphicPayload::Vector(data) => {
                assert_eq!(data.format, VectorFormat::Svg);
                assert_eq!(data.source, vec![1, 2, 3]);
                assert_eq!(data.page_index, Some(2));
            }
            other => panic!("unexpected payload {other:?}"),
        }

        let png = GfxLink::new(LinkFormat::Png, vec![9u8; 16]);
        assert_eq!(png.kind(), GraphicKind::Bitmap);
        let payload = png.materialize(None);
        assert_eq!(payload.kind(), GraphicKind::Bitmap);
        assert_eq!(payload.size_bytes(), 16);
    }
}
