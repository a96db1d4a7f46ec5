/// SVG document loading and per-sprite rasterization
use crate::constants::{OPEN_MAX_ATTEMPTS, OPEN_RETRY_BASE_DELAY_MS};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error types for document rendering operations.
#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Svg(usvg::Error),
    /// The document stayed unreadable across every allowed attempt.
    DocumentOpen { path: PathBuf, attempts: u32 },
    MissingSprite(String),
    PixmapAllocation { width: u32, height: u32 },
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err)
    }
}

impl From<usvg::Error> for RenderError {
    fn from(err: usvg::Error) -> Self {
        RenderError::Svg(err)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "IO error: {}", e),
            RenderError::Svg(e) => write!(f, "SVG error: {}", e),
            RenderError::DocumentOpen { path, attempts } => {
                write!(f, "could not open {} after {} attempts", path.display(), attempts)
            }
            RenderError::MissingSprite(name) => {
                write!(f, "sprite '{}' not found in document", name)
            }
            RenderError::PixmapAllocation { width, height } => {
                write!(f, "could not allocate a {}x{} raster canvas", width, height)
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Renders named document elements to transparent full-canvas buffers.
/// Selection and rasterization are deterministic for a fixed document, which
/// keeps the downstream atlas build reproducible.
pub struct SpriteRenderer {
    tree: usvg::Tree,
}

impl SpriteRenderer {
    /// Parses a document from raw bytes.
    pub fn from_data(data: &[u8]) -> Result<Self, RenderError> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
        Ok(Self { tree })
    }

    /// Opens a document from disk, retrying with exponential backoff. Editors
    /// save SVG files non-atomically, so a read can land mid-write; retries
    /// are bounded and end in a distinct terminal error.
    pub fn open(path: &Path) -> Result<Self, RenderError> {
        let mut delay = Duration::from_millis(OPEN_RETRY_BASE_DELAY_MS);
        for attempt in 1..=OPEN_MAX_ATTEMPTS {
            match std::fs::read(path)
                .map_err(RenderError::from)
                .and_then(|data| Self::from_data(&data))
            {
                Ok(renderer) => return Ok(renderer),
                Err(err) => {
                    log::warn!(
                        "open attempt {}/{} failed for {}: {}",
                        attempt,
                        OPEN_MAX_ATTEMPTS,
                        path.display(),
                        err
                    );
                }
            }
            if attempt < OPEN_MAX_ATTEMPTS {
                std::thread::sleep(delay);
                delay *= 2;
            }
        }
        Err(RenderError::DocumentOpen { path: path.to_path_buf(), attempts: OPEN_MAX_ATTEMPTS })
    }

    /// Document canvas size in whole pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let size = self.tree.size().to_int_size();
        (size.width(), size.height())
    }

    /// Ids of the sprites selected by `prefix`, in document order. Selection
    /// covers the grandchildren of the root, matching documents organized as
    /// layers of named objects; the parsed tree only retains renderable
    /// elements, so an id match is sufficient.
    pub fn sprite_names(&self, prefix: &str) -> Vec<String> {
        let mut names = Vec::new();
        for child in self.tree.root().children() {
            if let usvg::Node::Group(group) = child {
                for node in group.children() {
                    let id = node.id();
                    if !id.is_empty() && id.starts_with(prefix) {
                        names.push(id.to_string());
                    }
                }
            }
        }
        names
    }

    /// Rasterizes one sprite's subtree onto a transparent canvas sized to the
    /// document, leaving every other element out.
    pub fn rasterize(&self, name: &str) -> Result<RgbaImage, RenderError> {
        let node =
            self.find_sprite(name).ok_or_else(|| RenderError::MissingSprite(name.to_string()))?;

        let (width, height) = self.canvas_size();
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or(RenderError::PixmapAllocation { width, height })?;

        resvg::render_node(node, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(demultiply(&pixmap))
    }

    fn find_sprite(&self, name: &str) -> Option<&usvg::Node> {
        for child in self.tree.root().children() {
            if let usvg::Node::Group(group) = child {
                for node in group.children() {
                    if node.id() == name {
                        return Some(node);
                    }
                }
            }
        }
        None
    }
}

/// Converts a premultiplied tiny-skia pixmap into a straight-alpha buffer.
fn demultiply(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = image::Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    out
}
