/// Shared configuration for atlas generation

/// Sheet dimensions used as the packing upper bound; the final image is cropped
/// to its content, so these only have to be large enough
pub const SHEET_WIDTH: u32 = 1024;
pub const SHEET_HEIGHT: u32 = 1024;

/// Gap reserved past each placed sprite to prevent sampling bleed
pub const SPRITE_MARGIN: u32 = 1;

/// Default id prefix selecting which document elements become sprites
pub const DEFAULT_ID_PREFIX: &str = "s_";

/// Maximum open attempts for a document that may be mid-save
pub const OPEN_MAX_ATTEMPTS: u32 = 5;

/// Initial delay between open attempts; doubles after every failure
pub const OPEN_RETRY_BASE_DELAY_MS: u64 = 250;

/// Descriptor meta tags
pub const APP_NAME: &str = "svg-atlas-generator";
pub const FORMAT_VERSION: &str = "0.1";
pub const PIXEL_FORMAT: &str = "RGBA8888";

/// Artifact extensions; outputs are siblings of the source document
pub const IMAGE_EXTENSION: &str = "png";
pub const DESCRIPTOR_EXTENSION: &str = "json";
