//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "_source".into()
    }

    pub fn includes() -> PathBuf {
        "_includes".into()
    }

    pub fn output() -> PathBuf {
        "_site".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn template_ext() -> String {
        "njk".into()
    }

    pub fn output_ext() -> String {
        "html".into()
    }

    pub fn index() -> String {
        "index".into()
    }

    pub fn jobs() -> usize {
        0
    }
}

// ============================================================================
// [pagination] Section Defaults
// ============================================================================

pub mod pagination {
    pub fn name_field() -> String {
        "pageName".into()
    }

    pub fn index_name() -> String {
        "index".into()
    }

    pub fn alias() -> String {
        "content".into()
    }

    pub fn size() -> usize {
        1
    }
}

// ============================================================================
// [data] Section Defaults
// ============================================================================

pub mod data {
    use std::path::PathBuf;

    pub fn path() -> PathBuf {
        "_data/data.json".into()
    }

    pub fn key() -> String {
        "data".into()
    }
}

// ============================================================================
// Front Matter Defaults
// ============================================================================

pub mod front_matter {
    pub fn permalink() -> String {
        "/".into()
    }
}
