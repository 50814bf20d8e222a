use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Explicit name-to-implementation table for one extension kind
/// (toolsets, target types, ...). Each kind's registry is a first-class
/// object populated at process start and passed through pipeline
/// construction; there is no ambient singleton table.
pub struct ExtensionRegistry<T: ?Sized> {
    kind: &'static str,
    implementations: BTreeMap<String, Arc<T>>,
}

impl<T: ?Sized> ExtensionRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            implementations: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Registers an implementation under `name`. Registering the same
    /// name twice is a configuration bug and fails.
    pub fn register(&mut self, name: impl Into<String>, implementation: Arc<T>) -> Result<()> {
        let name = name.into();
        if self.implementations.contains_key(&name) {
            return Err(Error::Conflict {
                kind: self.kind,
                name,
            });
        }
        self.implementations.insert(name, implementation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<T>> {
        self.lookup(name).ok_or_else(|| Error::UnknownExtension {
            kind: self.kind,
            name: name.to_string(),
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<T>> {
        self.implementations.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.implementations.keys().map(|name| name.as_str())
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<T>> {
        self.implementations.values()
    }
}

impl<T: ?Sized> fmt::Debug for ExtensionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("kind", &self.kind)
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
