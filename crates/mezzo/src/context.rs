//! Loading the persona and knowledge-base documents.
//!
//! Both files live at fixed locations under a root directory:
//!
//! ```text
//! root/
//!   README.md                 persona / system manifest
//!   sops/
//!     knowledge_base.md       reference material
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ChatError;

/// Persona document, relative to the root.
pub const PERSONA_FILE: &str = "README.md";

/// Knowledge-base document, relative to the root.
pub const KNOWLEDGE_BASE_FILE: &str = "sops/knowledge_base.md";

/// Read `path` as UTF-8 text.
///
/// Returns `None` when the file is absent or unreadable (including invalid
/// UTF-8). The failure is logged; reporting it to the user is the caller's
/// job.
pub fn load_context(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!("Loaded {} ({} bytes)", path.display(), text.len());
            Some(text)
        }
        Err(e) => {
            warn!("Could not read {}: {e}", path.display());
            None
        }
    }
}

/// Resolved locations of the two context documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextPaths {
    pub persona: PathBuf,
    pub knowledge_base: PathBuf,
}

impl ContextPaths {
    /// Resolve the fixed relative locations under `root`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            persona: root.join(PERSONA_FILE),
            knowledge_base: root.join(KNOWLEDGE_BASE_FILE),
        }
    }
}

/// The two documents a session is built from.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub persona: String,
    pub knowledge_base: String,
}

/// Load both documents, failing on the first one that is missing or blank.
pub fn load_session_context(paths: &ContextPaths) -> Result<SessionContext, ChatError> {
    let persona = require(&paths.persona)?;
    let knowledge_base = require(&paths.knowledge_base)?;
    Ok(SessionContext {
        persona,
        knowledge_base,
    })
}

fn require(path: &Path) -> Result<String, ChatError> {
    let text = load_context(path).ok_or_else(|| ChatError::MissingContext {
        path: path.to_path_buf(),
    })?;
    if text.trim().is_empty() {
        return Err(ChatError::EmptyContext {
            path: path.to_path_buf(),
        });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn load_context_reads_text() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "You are Mezzo.");
        let text = load_context(&dir.path().join("README.md"));
        assert_eq!(text.as_deref(), Some("You are Mezzo."));
    }

    #[test]
    fn load_context_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load_context(&dir.path().join("nope.md")).is_none());
    }

    #[test]
    fn load_context_invalid_utf8_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        assert!(load_context(&path).is_none());
    }

    #[test]
    fn paths_resolve_under_root() {
        let paths = ContextPaths::under("/srv/mezzo");
        assert_eq!(paths.persona, PathBuf::from("/srv/mezzo/README.md"));
        assert!(paths.knowledge_base.ends_with(KNOWLEDGE_BASE_FILE));
    }

    #[test]
    fn session_context_loads_both() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "persona");
        write(dir.path(), "sops/knowledge_base.md", "hours: 9-5");
        let ctx = load_session_context(&ContextPaths::under(dir.path())).unwrap();
        assert_eq!(ctx.persona, "persona");
        assert_eq!(ctx.knowledge_base, "hours: 9-5");
    }

    #[test]
    fn missing_knowledge_base_names_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "persona");
        let err = load_session_context(&ContextPaths::under(dir.path())).unwrap_err();
        match err {
            ChatError::MissingContext { path } => {
                assert!(path.ends_with("sops/knowledge_base.md"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_persona_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "  \n\t\n");
        write(dir.path(), "sops/knowledge_base.md", "kb");
        let err = load_session_context(&ContextPaths::under(dir.path())).unwrap_err();
        assert!(matches!(err, ChatError::EmptyContext { ref path } if path.ends_with("README.md")));
    }
}
