//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn template_ext() -> String {
        "pw".into()
    }

    pub fn module_ext() -> String {
        "js".into()
    }

    pub fn output() -> PathBuf {
        ".pagewright".into()
    }

    pub fn copy_dirs() -> Vec<String> {
        vec!["assets".into(), "public".into()]
    }
}

// ============================================================================
// [bundler] Section Defaults
// ============================================================================

pub mod bundler {
    pub fn command() -> Vec<String> {
        vec!["esbuild".into()]
    }
}
