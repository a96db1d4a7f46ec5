/// Per-document pipeline: staleness check, atlas build, artifact persistence
use crate::atlas::{self, AtlasError};
use crate::constants::{
    DESCRIPTOR_EXTENSION, IMAGE_EXTENSION, SHEET_HEIGHT, SHEET_WIDTH, SPRITE_MARGIN,
};
use crate::renderer::SpriteRenderer;
use std::fs;
use std::path::Path;

/// Builds the sprite sheet and descriptor for one SVG document at a time.
/// Holds only configuration, so one generator can serve many documents,
/// including in parallel.
pub struct AtlasGenerator {
    prefix: String,
    sheet_width: u32,
    sheet_height: u32,
    margin: u32,
}

impl AtlasGenerator {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            sheet_width: SHEET_WIDTH,
            sheet_height: SHEET_HEIGHT,
            margin: SPRITE_MARGIN,
        }
    }

    /// Rebuilds the atlas for one document unless its outputs are already
    /// fresh. Both artifacts are written only after the whole build
    /// succeeded, so a failed build never leaves a partial pair behind.
    /// Returns whether a rebuild ran.
    pub fn process_file(&self, svg_path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
        let image_path = svg_path.with_extension(IMAGE_EXTENSION);
        let descriptor_path = svg_path.with_extension(DESCRIPTOR_EXTENSION);

        if outputs_fresh(svg_path, &descriptor_path, &image_path)? {
            log::info!("{} is up to date", svg_path.display());
            return Ok(false);
        }

        log::info!("building atlas for {}", svg_path.display());

        let renderer = SpriteRenderer::open(svg_path)?;
        let names = renderer.sprite_names(&self.prefix);
        let image_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (sheet, descriptor) = atlas::build_atlas(
            &names,
            |name| {
                renderer.rasterize(name).map_err(|err| {
                    // Distinguishable from a transparent sprite in the log,
                    // identical in propagation.
                    log::warn!("rasterization failed for '{}': {}", name, err);
                    AtlasError::SourceUnavailable(name.to_string())
                })
            },
            self.sheet_width,
            self.sheet_height,
            self.margin,
            &image_name,
        )?;

        sheet.save(&image_path)?;
        fs::write(&descriptor_path, serde_json::to_string_pretty(&descriptor)?)?;

        log::info!(
            "wrote {} ({}x{}, {} sprites) and {}",
            image_path.display(),
            descriptor.meta.size.w,
            descriptor.meta.size.h,
            descriptor.frames.len(),
            descriptor_path.display()
        );
        Ok(true)
    }
}

/// Outputs are fresh when both exist and the descriptor is no older than the
/// source document.
fn outputs_fresh(svg: &Path, descriptor: &Path, image: &Path) -> Result<bool, std::io::Error> {
    if !descriptor.exists() || !image.exists() {
        return Ok(false);
    }
    let source_time = fs::metadata(svg)?.modified()?;
    let output_time = fs::metadata(descriptor)?.modified()?;
    Ok(output_time >= source_time)
}
