use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Leading storage version segment in an object path
    /// - Matches: "v12345/folder/file.pdf"
    /// - No match: "vivienda/file.pdf", "v/file.pdf", "folder/v1/file.pdf"
    pub static ref VERSION_SEGMENT_REGEX: Regex = Regex::new(r"^v\d+/").unwrap();

    /// Plain calendar date accepted for explicit report windows
    /// - Valid: "2025-01-06"
    /// - Invalid: "2025-1-6", "06/01/2025", "2025-01-06T00:00:00Z"
    pub static ref ISO_DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}
