//! Normalized vault-relative path handling

use std::path::{Path, PathBuf};

/// A vault-relative path normalized to forward slashes.
///
/// Generated note paths are produced with forward slashes regardless of
/// platform; conversion to the native representation happens only at the
/// I/O boundary inside [`crate::FsVault`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VaultPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl VaultPath {
    /// Create a new VaultPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and strips leading slashes
    /// so the result is always relative to the vault root.
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = path.as_ref().replace('\\', "/");
        let trimmed = normalized.trim_start_matches('/');
        Self {
            inner: trimmed.to_string(),
        }
    }

    /// Get the normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether the path is empty (a generator opt-out).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether any component walks upward out of the vault root.
    pub fn escapes_root(&self) -> bool {
        self.inner.split('/').any(|c| c == "..")
    }

    /// Resolve against a vault root for native I/O.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut native = root.to_path_buf();
        for component in self.inner.split('/').filter(|c| !c.is_empty()) {
            native.push(component);
        }
        native
    }

    /// The parent directory, if any.
    pub fn parent(&self) -> Option<Self> {
        let idx = self.inner.trim_end_matches('/').rfind('/')?;
        Some(Self {
            inner: self.inner[..idx].to_string(),
        })
    }

    /// The final path component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

impl std::fmt::Display for VaultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for VaultPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for VaultPath {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}
