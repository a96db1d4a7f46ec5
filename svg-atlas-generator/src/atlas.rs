/// Sprite sheet composition and atlas descriptor generation
use crate::constants::{APP_NAME, FORMAT_VERSION, IMAGE_EXTENSION, PIXEL_FORMAT};
use crate::packer::{MaxRectsPacker, Rect};
use crate::trim::trim;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error types for atlas composition.
#[derive(Debug)]
pub enum AtlasError {
    /// A selected element rasterized to a fully transparent buffer.
    EmptySprite(String),
    /// No free rectangle could hold the requested placement.
    SheetFull { sprite: String, width: u32, height: u32, occupancy: f32 },
    /// Nothing was placed, or the composed sheet carries no visible pixel.
    EmptySheet,
    /// The renderer could not produce a buffer for a selected element.
    SourceUnavailable(String),
}

impl std::fmt::Display for AtlasError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasError::EmptySprite(name) => {
                write!(f, "sprite '{}' rasterized to a fully transparent image", name)
            }
            AtlasError::SheetFull { sprite, width, height, occupancy } => write!(
                f,
                "no space left for sprite '{}' ({}x{} requested, sheet {:.1}% occupied)",
                sprite,
                width,
                height,
                occupancy * 100.0
            ),
            AtlasError::EmptySheet => write!(f, "no sprites were placed, the sheet is empty"),
            AtlasError::SourceUnavailable(name) => {
                write!(f, "no raster data available for sprite '{}'", name)
            }
        }
    }
}

impl std::error::Error for AtlasError {}

/// Pixel rectangle within the sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Width/height pair for descriptor size fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameSize {
    pub w: u32,
    pub h: u32,
}

/// One sprite's entry in the descriptor. `spriteSourceSize` and `sourceSize`
/// equal the frame's own size: frames are recorded tight-cropped and no
/// pre-trim offset is tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDefinition {
    pub rotated: bool,
    pub trimmed: bool,
    pub frame: FrameRect,
    pub sprite_source_size: FrameRect,
    pub source_size: FrameSize,
}

/// Descriptor metadata: application tag, output image name and final size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDefinition {
    pub app: String,
    pub version: String,
    pub image: String,
    pub format: String,
    pub size: FrameSize,
    pub scale: f32,
}

/// Complete atlas descriptor, serialized as pretty-printed camelCase JSON.
/// Frames are keyed by sprite name plus the image extension; the sorted map
/// keeps rebuilds byte-identical and lets a duplicate sprite name silently
/// overwrite the earlier entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasDefinition {
    pub frames: BTreeMap<String, FrameDefinition>,
    pub meta: MetaDefinition,
}

impl AtlasDefinition {
    pub fn new() -> Self {
        Self {
            frames: BTreeMap::new(),
            meta: MetaDefinition {
                app: APP_NAME.to_string(),
                version: FORMAT_VERSION.to_string(),
                image: String::new(),
                format: PIXEL_FORMAT.to_string(),
                size: FrameSize { w: 0, h: 0 },
                scale: 1.0,
            },
        }
    }

    /// Records a frame under `name`.
    pub fn add_frame(&mut self, name: &str, rect: Rect) {
        let frame = FrameDefinition {
            rotated: false,
            trimmed: true,
            frame: FrameRect { x: rect.x, y: rect.y, w: rect.w, h: rect.h },
            sprite_source_size: FrameRect { x: 0, y: 0, w: rect.w, h: rect.h },
            source_size: FrameSize { w: rect.w, h: rect.h },
        };
        self.frames.insert(format!("{}.{}", name, IMAGE_EXTENSION), frame);
    }

    /// Fills the metadata with the output image name and its final size.
    pub fn set_meta(&mut self, image_name: &str, width: u32, height: u32) {
        self.meta.image = image_name.to_string();
        self.meta.size = FrameSize { w: width, h: height };
    }
}

/// Builds one sprite sheet. Sprites are added in caller order; the order has
/// no semantic meaning but determines the packed layout. One composer builds
/// one sheet and owns all of its state, so independent builds can run in
/// parallel without coordination.
pub struct SheetComposer {
    sheet: RgbaImage,
    packer: MaxRectsPacker,
    atlas: AtlasDefinition,
    margin: u32,
}

impl SheetComposer {
    pub fn new(sheet_width: u32, sheet_height: u32, margin: u32) -> Self {
        Self {
            sheet: RgbaImage::new(sheet_width, sheet_height),
            packer: MaxRectsPacker::new(sheet_width, sheet_height, false),
            atlas: AtlasDefinition::new(),
            margin,
        }
    }

    /// Trims one rasterized sprite, places it padded by the margin, blits the
    /// cropped pixels into the sheet and records the frame.
    pub fn add_sprite(&mut self, name: &str, rendered: &RgbaImage) -> Result<(), AtlasError> {
        let cropped = trim(rendered).ok_or_else(|| AtlasError::EmptySprite(name.to_string()))?;
        let (width, height) = cropped.dimensions();

        let padded = self.packer.insert(width + self.margin, height + self.margin).ok_or_else(
            || AtlasError::SheetFull {
                sprite: name.to_string(),
                width: width + self.margin,
                height: height + self.margin,
                occupancy: self.packer.occupancy(),
            },
        )?;

        // Deflate the trailing edges: neighbours keep a margin-wide gap while
        // the recorded rect matches the cropped sprite itself.
        let rect = Rect { x: padded.x, y: padded.y, w: width, h: height };

        // Opaque overwrite; destination pixels under the sprite are replaced,
        // not blended.
        image::imageops::replace(&mut self.sheet, &cropped, rect.x as i64, rect.y as i64);
        self.atlas.add_frame(name, rect);
        Ok(())
    }

    /// Crops the sheet to its content and finalizes the descriptor. Sheet
    /// dimensions are a worst-case upper bound, not the true output size.
    pub fn finish(self, image_name: &str) -> Result<(RgbaImage, AtlasDefinition), AtlasError> {
        let mut atlas = self.atlas;
        if atlas.frames.is_empty() {
            return Err(AtlasError::EmptySheet);
        }

        // The first placement lands at the sheet origin with visible pixels
        // on its edges, so cropping only ever removes right/bottom slack and
        // the recorded frames stay valid.
        let sheet = trim(&self.sheet).ok_or(AtlasError::EmptySheet)?;
        atlas.set_meta(image_name, sheet.width(), sheet.height());
        Ok((sheet, atlas))
    }
}

/// Drives a full build: rasterize, trim, place and blit each named sprite in
/// order, then crop the sheet and finalize the descriptor. Any failure aborts
/// the whole build; nothing is persisted here.
pub fn build_atlas<F>(
    names: &[String],
    mut rasterize: F,
    sheet_width: u32,
    sheet_height: u32,
    margin: u32,
    image_name: &str,
) -> Result<(RgbaImage, AtlasDefinition), AtlasError>
where
    F: FnMut(&str) -> Result<RgbaImage, AtlasError>,
{
    let mut composer = SheetComposer::new(sheet_width, sheet_height, margin);
    for name in names {
        let rendered = rasterize(name)?;
        composer.add_sprite(name, &rendered)?;
    }
    composer.finish(image_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Document-canvas-sized buffer with one opaque box drawn into it.
    fn canvas_with_box(origin: (u32, u32), size: (u32, u32)) -> RgbaImage {
        let mut canvas = RgbaImage::new(1024, 1024);
        for y in origin.1..origin.1 + size.1 {
            for x in origin.0..origin.0 + size.0 {
                canvas.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        canvas
    }

    fn scenario_rasterize(name: &str) -> Result<RgbaImage, AtlasError> {
        match name {
            "s_a" => Ok(canvas_with_box((10, 20), (80, 40))),
            "s_b" => Ok(canvas_with_box((500, 600), (10, 10))),
            "s_c" => Ok(RgbaImage::new(1024, 1024)),
            other => Err(AtlasError::SourceUnavailable(other.to_string())),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn frames_overlap(a: &FrameRect, b: &FrameRect) -> bool {
        a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
    }

    #[test]
    fn test_transparent_sprite_aborts_build() {
        let result = build_atlas(
            &names(&["s_a", "s_b", "s_c"]),
            scenario_rasterize,
            1024,
            1024,
            1,
            "scenario.png",
        );
        match result {
            Err(AtlasError::EmptySprite(name)) => assert_eq!(name, "s_c"),
            other => panic!("expected EmptySprite, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_two_sprite_scenario() {
        let (sheet, atlas) = build_atlas(
            &names(&["s_a", "s_b"]),
            scenario_rasterize,
            1024,
            1024,
            1,
            "scenario.png",
        )
        .unwrap();

        assert_eq!(atlas.frames.len(), 2);
        let a = &atlas.frames["s_a.png"];
        let b = &atlas.frames["s_b.png"];
        assert_eq!((a.frame.w, a.frame.h), (80, 40));
        assert_eq!((b.frame.w, b.frame.h), (10, 10));
        assert!(!frames_overlap(&a.frame, &b.frame));

        // Derived sizes equal the frame's own size.
        assert_eq!((a.source_size.w, a.source_size.h), (80, 40));
        assert_eq!((a.sprite_source_size.w, a.sprite_source_size.h), (80, 40));
        assert!(a.trimmed && !a.rotated);

        // The final image is cropped to the union bounding box of the frames.
        let union_w = atlas.frames.values().map(|f| f.frame.x + f.frame.w).max().unwrap();
        let union_h = atlas.frames.values().map(|f| f.frame.y + f.frame.h).max().unwrap();
        assert_eq!(sheet.dimensions(), (union_w, union_h));
        assert_eq!((atlas.meta.size.w, atlas.meta.size.h), (union_w, union_h));
        assert_eq!(atlas.meta.image, "scenario.png");
    }

    #[test]
    fn test_blit_is_opaque_overwrite() {
        let (sheet, atlas) = build_atlas(
            &names(&["s_a"]),
            scenario_rasterize,
            1024,
            1024,
            1,
            "one.png",
        )
        .unwrap();

        let frame = &atlas.frames["s_a.png"].frame;
        for y in frame.y..frame.y + frame.h {
            for x in frame.x..frame.x + frame.w {
                assert_eq!(*sheet.get_pixel(x, y), Rgba([255, 255, 255, 255]));
            }
        }
    }

    #[test]
    fn test_margin_keeps_sprites_apart() {
        let square = |_: &str| Ok(canvas_with_box((0, 0), (50, 50)));
        let (_, atlas) =
            build_atlas(&names(&["s_one", "s_two"]), square, 1024, 1024, 2, "m.png").unwrap();

        let one = &atlas.frames["s_one.png"].frame;
        let two = &atlas.frames["s_two.png"].frame;
        let center = |f: &FrameRect| (f.x * 2 + f.w, f.y * 2 + f.h);
        let (cx1, cy1) = center(one);
        let (cx2, cy2) = center(two);

        // Center distance in half-pixel units; on the separating axis the
        // centers must be at least 50 + margin apart.
        let dx = cx1.abs_diff(cx2);
        let dy = cy1.abs_diff(cy2);
        assert!(dx.max(dy) >= 2 * 52, "centers too close: dx={} dy={}", dx, dy);
    }

    #[test]
    fn test_sheet_full_names_the_sprite() {
        let big = |_: &str| Ok(canvas_with_box((0, 0), (90, 90)));
        let result = build_atlas(&names(&["s_first", "s_second"]), big, 100, 100, 1, "f.png");
        match result {
            Err(AtlasError::SheetFull { sprite, width, height, occupancy }) => {
                assert_eq!(sprite, "s_second");
                assert_eq!((width, height), (91, 91));
                assert!(occupancy > 0.0);
            }
            other => panic!("expected SheetFull, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_no_sprites_is_empty_sheet() {
        let result = build_atlas(&[], scenario_rasterize, 1024, 1024, 1, "empty.png");
        assert!(matches!(result, Err(AtlasError::EmptySheet)));
    }

    #[test]
    fn test_duplicate_names_overwrite() {
        let mut composer = SheetComposer::new(1024, 1024, 1);
        composer.add_sprite("s_dup", &canvas_with_box((0, 0), (20, 20))).unwrap();
        composer.add_sprite("s_dup", &canvas_with_box((0, 0), (30, 30))).unwrap();

        let (_, atlas) = composer.finish("dup.png").unwrap();
        assert_eq!(atlas.frames.len(), 1);
        assert_eq!(atlas.frames["s_dup.png"].frame.w, 30);
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let build = || {
            let (_, atlas) = build_atlas(
                &names(&["s_a", "s_b"]),
                scenario_rasterize,
                1024,
                1024,
                1,
                "scenario.png",
            )
            .unwrap();
            serde_json::to_string_pretty(&atlas).unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_descriptor_field_names_are_camel_case() {
        let (_, atlas) = build_atlas(
            &names(&["s_a"]),
            scenario_rasterize,
            1024,
            1024,
            1,
            "scenario.png",
        )
        .unwrap();

        let json = serde_json::to_string_pretty(&atlas).unwrap();
        assert!(json.contains("\"spriteSourceSize\""));
        assert!(json.contains("\"sourceSize\""));
        assert!(json.contains("\"trimmed\""));
        assert!(json.contains("\"frames\""));
        assert!(json.contains("\"meta\""));
    }
}
