//! Cached RGBA raster of a lattice: holes where shards were lost, darkened
//! decals where they are damaged.
//!
//! Updated incrementally on impact. Only re-centring forces a full redraw,
//! because it moves every shard relative to the raster origin.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::hex::HexGeometry;
use super::shard::Shard;

/// Local units covered by one texel edge.
pub const TEXEL_SIZE: f32 = 1.0;

/// Decals darken a fully damaged shard to this fraction of its base colour.
const DECAL_FLOOR: f32 = 0.35;
/// Holes are cut slightly wider than the cell to avoid seams.
const HOLE_MARGIN: f32 = 1.05;

/// One RGBA8 texel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Texel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Texel {
    pub const CLEAR: Texel = Texel { r: 0, g: 0, b: 0, a: 0 };
    pub const HULL: Texel = Texel { r: 148, g: 156, b: 168, a: 255 };
    pub const CORE: Texel = Texel { r: 196, g: 128, b: 82, a: 255 };

    fn base(is_core: bool) -> Texel {
        if is_core {
            Self::CORE
        } else {
            Self::HULL
        }
    }

    /// Base colour darkened by damage severity.
    fn shaded(is_core: bool, severity: f32) -> Texel {
        let base = Self::base(is_core);
        let k = 1.0 - (1.0 - DECAL_FLOOR) * severity.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * k).round() as u8;
        Texel {
            r: scale(base.r),
            g: scale(base.g),
            b: scale(base.b),
            a: base.a,
        }
    }
}

/// Raster cache owned by one lattice. Queried, never mutated, by renderers.
#[derive(Debug, Clone, Default)]
pub struct DamageRaster {
    width: u32,
    height: u32,
    /// Local-frame position of the top-left texel corner.
    origin: Vec2,
    texels: Vec<Texel>,
}

impl DamageRaster {
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn texel(&self, x: u32, y: u32) -> Option<Texel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get((y * self.width + x) as usize).copied()
    }

    /// Texel colour at a local-frame point, if inside the raster.
    pub fn sample(&self, local: Vec2) -> Option<Texel> {
        let p = (local - self.origin) / TEXEL_SIZE;
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        self.texel(p.x as u32, p.y as u32)
    }

    /// Raw RGBA8 bytes, row-major, for texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Redraw from scratch covering `[offset, offset + size]`.
    pub(crate) fn redraw<'a>(
        &mut self,
        offset: Vec2,
        size: Vec2,
        radius: f32,
        shards: impl IntoIterator<Item = &'a Shard>,
    ) {
        self.origin = offset;
        self.width = (size.x / TEXEL_SIZE).ceil().max(0.0) as u32;
        self.height = (size.y / TEXEL_SIZE).ceil().max(0.0) as u32;
        self.texels.clear();
        self.texels
            .resize((self.width * self.height) as usize, Texel::CLEAR);

        for shard in shards {
            let colour = Texel::shaded(shard.is_core, shard.severity());
            self.fill_hexagon(shard.position, radius, colour);
        }
    }

    /// Clear the texels covered by a lost shard.
    pub(crate) fn cut_hole(&mut self, center: Vec2, radius: f32) {
        self.fill_hexagon(center, radius * HOLE_MARGIN, Texel::CLEAR);
    }

    /// Repaint a damaged shard darkened by `severity`.
    pub(crate) fn paint_decal(&mut self, center: Vec2, radius: f32, is_core: bool, severity: f32) {
        self.fill_hexagon(center, radius, Texel::shaded(is_core, severity));
    }

    fn fill_hexagon(&mut self, center: Vec2, radius: f32, colour: Texel) {
        if self.texels.is_empty() {
            return;
        }
        let min = ((center - Vec2::splat(radius) - self.origin) / TEXEL_SIZE).floor();
        let max = ((center + Vec2::splat(radius) - self.origin) / TEXEL_SIZE).ceil();
        let x0 = min.x.max(0.0) as u32;
        let y0 = min.y.max(0.0) as u32;
        let x1 = (max.x.max(0.0) as u32).min(self.width);
        let y1 = (max.y.max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let texel_center =
                    self.origin + (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) * TEXEL_SIZE;
                if HexGeometry::hexagon_contains(texel_center - center, radius) {
                    self.texels[(y * self.width + x) as usize] = colour;
                }
            }
        }
    }
}
