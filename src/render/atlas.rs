//! Texture atlas: packed block textures and normalized UV lookup
//!
//! Tiles are packed on shelves: rows are filled left to right and a new row
//! starts below the tallest tile of the current one when the next tile would
//! overflow the row width. The row width is `ceil(sqrt(total tile area))`,
//! widened to the widest tile if needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use image::RgbaImage;

use crate::core::Result;

/// Normalized placement of one texture inside the atlas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubTexture {
    /// Top-left corner in UV space
    pub position: Vec2,
    /// Width and height in UV space
    pub dimensions: Vec2,
}

impl SubTexture {
    pub fn new(position: Vec2, dimensions: Vec2) -> Self {
        Self { position, dimensions }
    }

    /// UV corners in face-vertex order: origin, +w, +w+h, +h
    pub fn corners(&self) -> [Vec2; 4] {
        let p = self.position;
        let d = self.dimensions;
        [
            p,
            Vec2::new(p.x + d.x, p.y),
            Vec2::new(p.x + d.x, p.y + d.y),
            Vec2::new(p.x, p.y + d.y),
        ]
    }
}

/// Pixel placement produced by the packer
#[derive(Clone, Debug, PartialEq, Eq)]
struct Placement {
    name: String,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Named lookup table from texture name to atlas sub-rectangle
#[derive(Clone, Debug)]
pub struct TextureAtlas {
    name: String,
    width: u32,
    height: u32,
    entries: HashMap<String, SubTexture>,
}

impl TextureAtlas {
    /// Create an empty atlas
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 0,
            height: 0,
            entries: HashMap::new(),
        }
    }

    /// Add or replace one entry (builder style)
    pub fn with_entry(mut self, texture: impl Into<String>, sub: SubTexture) -> Self {
        self.insert(texture, sub);
        self
    }

    /// Add or replace one entry
    pub fn insert(&mut self, texture: impl Into<String>, sub: SubTexture) {
        self.entries.insert(texture.into(), sub);
    }

    /// Pack tiles of the given pixel sizes and build the lookup table.
    ///
    /// Tiles are placed in the order given.
    pub fn pack(name: impl Into<String>, tiles: &[(String, u32, u32)]) -> Self {
        let (width, height, placements) = pack_shelves(tiles);
        let mut atlas = Self::new(name);
        atlas.width = width;
        atlas.height = height;

        if width == 0 || height == 0 {
            log::warn!("Texture atlas '{}' has no tiles to pack", atlas.name);
            return atlas;
        }

        let size = Vec2::new(width as f32, height as f32);
        for p in placements {
            let sub = SubTexture::new(
                Vec2::new(p.x as f32, p.y as f32) / size,
                Vec2::new(p.width as f32, p.height as f32) / size,
            );
            atlas.entries.insert(p.name, sub);
        }
        atlas
    }

    /// Load every `.png` in `dir` (sorted by file name), pack them and compose
    /// the atlas image. Texture names are file stems.
    pub fn from_directory(name: impl Into<String>, dir: &Path) -> Result<(Self, RgbaImage)> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file() && p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut tiles = Vec::with_capacity(paths.len());
        let mut images = Vec::with_capacity(paths.len());
        for path in &paths {
            let image = image::open(path)?.to_rgba8();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            tiles.push((stem, image.width(), image.height()));
            images.push(image);
        }

        let (width, height, placements) = pack_shelves(&tiles);
        let mut canvas = RgbaImage::new(width, height);
        for (placement, image) in placements.iter().zip(&images) {
            image::imageops::replace(&mut canvas, image, placement.x as i64, placement.y as i64);
        }

        let atlas = Self::pack(name, &tiles);
        log::info!(
            "Packed texture atlas '{}': {} textures into {}x{}",
            atlas.name, atlas.len(), width, height
        );
        Ok((atlas, canvas))
    }

    /// Write a composed atlas image as `<Name>Atlas.png` inside `dir`
    pub fn save_image(&self, image: &RgbaImage, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let mut chars = self.name.chars();
        let file_stem: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        let path = dir.join(format!("{file_stem}Atlas.png"));

        image.save(&path)?;
        log::info!("Saved texture atlas '{}' to {}", self.name, path.display());
        Ok(path)
    }

    /// UV corners of a texture.
    ///
    /// An unknown name is not fatal: it logs a warning and returns a
    /// zero-size rectangle so meshing can continue.
    pub fn texture_coordinates(&self, texture: &str) -> [Vec2; 4] {
        match self.entries.get(texture) {
            Some(sub) => sub.corners(),
            None => {
                log::warn!("Texture '{}' not found in atlas '{}'", texture, self.name);
                [Vec2::ZERO; 4]
            }
        }
    }

    pub fn get(&self, texture: &str) -> Option<&SubTexture> {
        self.entries.get(texture)
    }

    pub fn contains(&self, texture: &str) -> bool {
        self.entries.contains_key(texture)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel size of the packed atlas (zero for hand-built tables)
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shelf packing. Returns atlas width, height and per-tile placements.
fn pack_shelves(tiles: &[(String, u32, u32)]) -> (u32, u32, Vec<Placement>) {
    if tiles.is_empty() {
        return (0, 0, Vec::new());
    }

    let total_area: u64 = tiles.iter().map(|(_, w, h)| *w as u64 * *h as u64).sum();
    let widest = tiles.iter().map(|(_, w, _)| *w).max().unwrap_or(0);
    let width = ((total_area as f64).sqrt().ceil() as u32).max(widest);

    let mut placements = Vec::with_capacity(tiles.len());
    let mut x = 0u32;
    let mut y = 0u32;
    let mut shelf_height = 0u32;

    for (name, w, h) in tiles {
        if x + w > width {
            x = 0;
            y += shelf_height;
            shelf_height = 0;
        }
        shelf_height = shelf_height.max(*h);

        placements.push(Placement {
            name: name.clone(),
            x,
            y,
            width: *w,
            height: *h,
        });
        x += w;
    }

    // Atlases are at least square
    let height = (y + shelf_height).max(width);
    (width, height, placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(name: &str, w: u32, h: u32) -> (String, u32, u32) {
        (name.to_string(), w, h)
    }

    #[test]
    fn test_corners_order() {
        let sub = SubTexture::new(Vec2::new(0.25, 0.5), Vec2::new(0.25, 0.5));
        assert_eq!(
            sub.corners(),
            [
                Vec2::new(0.25, 0.5),
                Vec2::new(0.5, 0.5),
                Vec2::new(0.5, 1.0),
                Vec2::new(0.25, 1.0),
            ]
        );
    }

    #[test]
    fn test_missing_texture_is_degenerate() {
        let atlas = TextureAtlas::new("default");
        assert_eq!(atlas.texture_coordinates("dirt"), [Vec2::ZERO; 4]);
    }

    #[test]
    fn test_pack_four_equal_tiles() {
        let atlas = TextureAtlas::pack(
            "blocks",
            &[tile("a", 16, 16), tile("b", 16, 16), tile("c", 16, 16), tile("d", 16, 16)],
        );

        assert_eq!(atlas.pixel_size(), (32, 32));
        assert_eq!(atlas.get("a").unwrap().position, Vec2::new(0.0, 0.0));
        assert_eq!(atlas.get("b").unwrap().position, Vec2::new(0.5, 0.0));
        assert_eq!(atlas.get("c").unwrap().position, Vec2::new(0.0, 0.5));
        assert_eq!(atlas.get("d").unwrap().position, Vec2::new(0.5, 0.5));
        assert_eq!(atlas.get("d").unwrap().dimensions, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_pack_never_overlaps() {
        let tiles = [
            tile("a", 10, 4),
            tile("b", 3, 9),
            tile("c", 7, 7),
            tile("d", 12, 2),
            tile("e", 5, 5),
        ];
        let (width, height, placements) = pack_shelves(&tiles);

        for p in &placements {
            assert!(p.x + p.width <= width);
            assert!(p.y + p.height <= height);
        }
        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                let disjoint = a.x + a.width <= b.x
                    || b.x + b.width <= a.x
                    || a.y + a.height <= b.y
                    || b.y + b.height <= a.y;
                assert!(disjoint, "{} overlaps {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_pack_empty() {
        let atlas = TextureAtlas::pack("empty", &[]);
        assert!(atlas.is_empty());
        assert_eq!(atlas.pixel_size(), (0, 0));
    }

    #[test]
    fn test_from_directory_and_save() {
        let dir = tempfile::tempdir().unwrap();
        for (name, color) in [("dirt", [120, 80, 40, 255]), ("grass", [40, 160, 40, 255])] {
            let img = RgbaImage::from_pixel(8, 8, image::Rgba(color));
            img.save(dir.path().join(format!("{name}.png"))).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a texture").unwrap();

        let (atlas, canvas) = TextureAtlas::from_directory("default", dir.path()).unwrap();
        assert_eq!(atlas.len(), 2);
        assert!(atlas.contains("dirt"));
        assert!(atlas.contains("grass"));
        // Row width is ceil(sqrt(128)) = 12, so the second tile wraps to a new shelf
        assert_eq!(canvas.dimensions(), (12, 16));
        assert_eq!(canvas.get_pixel(0, 0).0, [120, 80, 40, 255]);
        assert_eq!(canvas.get_pixel(0, 8).0, [40, 160, 40, 255]);
        assert_eq!(atlas.get("grass").unwrap().position, Vec2::new(0.0, 0.5));

        let out = tempfile::tempdir().unwrap();
        let path = atlas.save_image(&canvas, out.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "DefaultAtlas.png");
        assert!(path.exists());
    }
}
