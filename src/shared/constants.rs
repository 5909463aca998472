/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// REPORT DOCUMENTS
// =============================================================================

/// Extension every stored report carries exactly once
pub const REPORT_EXTENSION: &str = ".pdf";

/// MIME type of rendered reports
pub const REPORT_CONTENT_TYPE: &str = "application/pdf";

/// Heading used for photos without a category
pub const OTHER_CATEGORY_LABEL: &str = "OTROS TRABAJOS";

/// Text drawn inside the placeholder of a photo that could not be loaded
pub const IMAGE_UNAVAILABLE_TEXT: &str = "Imagen no disponible";
