//! Prompt fragments: a keyed store and a read-through cache over it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::contracts::{QuestionType, Track};

/// Logical name of one prompt fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromptKey {
    /// Shared fragment, `common/<name>`.
    Common(&'static str),
    /// Lane fragment, `lanes/<track>_<type>`.
    Lane(Track, QuestionType),
}

impl PromptKey {
    /// Generic generator instructions.
    pub const GENERATOR_BASE: Self = Self::Common("generator_base");
    /// Generic evaluator instructions.
    pub const EVALUATOR_BASE: Self = Self::Common("evaluator_base");
    /// JSON formatting rules appended to every system prompt.
    pub const JSON_RULES: Self = Self::Common("json_rules");
    /// System prompt of the repair stage.
    pub const JSON_REPAIR: Self = Self::Common("json_repair");

    /// Path of this fragment relative to a store root.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        match self {
            Self::Common(name) => Path::new("common").join(format!("{name}.txt")),
            Self::Lane(track, question_type) => {
                Path::new("lanes").join(format!("{track}_{question_type}.txt"))
            }
        }
    }
}

impl fmt::Display for PromptKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Common(name) => write!(f, "common/{name}"),
            Self::Lane(track, question_type) => write!(f, "lanes/{track}_{question_type}"),
        }
    }
}

/// Prompt store failures.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No fragment exists under the key.
    #[error("missing prompt fragment {key} ({})", path.display())]
    NotFound {
        /// Logical key.
        key: String,
        /// Where it was looked for.
        path: PathBuf,
    },

    /// The fragment exists but could not be read.
    #[error("failed to read prompt fragment {key}: {source}")]
    Io {
        /// Logical key.
        key: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Keyed lookup of prompt fragments.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Loads one fragment.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::NotFound`] when the key is absent.
    async fn load(&self, key: &PromptKey) -> Result<String, PromptError>;
}

/// Fragments stored as `<root>/common/<name>.txt` and
/// `<root>/lanes/<track>_<type>.txt`.
#[derive(Debug, Clone)]
pub struct FsPromptStore {
    root: PathBuf,
}

impl FsPromptStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl PromptStore for FsPromptStore {
    async fn load(&self, key: &PromptKey) -> Result<String, PromptError> {
        let path = self.root.join(key.relative_path());
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content.trim().to_string()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(PromptError::NotFound {
                key: key.to_string(),
                path,
            }),
            Err(source) => Err(PromptError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Read-through memo over a [`PromptStore`].
///
/// After the first successful load of a key the store is never asked for it
/// again. Two tasks racing on the same cold key may both hit the store; both
/// insert identical content, so whichever write lands last is equivalent.
/// The lock only guards map operations and is never held across a load.
pub struct PromptCache {
    store: Box<dyn PromptStore>,
    entries: RwLock<HashMap<PromptKey, String>>,
}

impl PromptCache {
    /// Wraps `store` with an empty cache.
    pub fn new(store: impl PromptStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the fragment for `key`, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the store error; failures are not cached.
    pub async fn get(&self, key: &PromptKey) -> Result<String, PromptError> {
        if let Some(content) = self.cached(key) {
            return Ok(content);
        }

        let content = self.store.load(key).await?;
        self.write_entries().insert(key.clone(), content.clone());
        tracing::debug!(event = "prompt_loaded", key = %key, "prompt_loaded");
        Ok(content)
    }

    fn cached(&self, key: &PromptKey) -> Option<String> {
        self.read_entries().get(key).cloned()
    }

    // Every entry is a complete fragment, so a map left behind by a panicking
    // holder is still usable.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<PromptKey, String>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!(event = "prompt_cache_poisoned", "prompt_cache_poisoned");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<PromptKey, String>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!(event = "prompt_cache_poisoned", "prompt_cache_poisoned");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Number of cached fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PromptCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
