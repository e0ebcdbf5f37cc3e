// src/payload/registry.rs

//! Named handlers that `Work::Handler` payloads refer to.
//!
//! A planning process only checks that a handler name is registered; the
//! runner process looks the name up again and calls it. Both sides must be
//! built with the same registry for a plan to be runnable, which is why the
//! default runner command is the planning binary itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

/// Signature of a registered handler: serialized arguments plus the array index.
pub type Handler = Arc<dyn Fn(&toml::Table, Option<u32>) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandlerRegistry {
    /// An empty registry. Only shell work units can be packaged against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers shipped in the `slurmdag` binary.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("touch", touch);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&toml::Table, Option<u32>) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|s| s.as_str())
    }
}

/// Create every file in `args.paths`, replacing `{index}` with the array index.
fn touch(args: &toml::Table, index: Option<u32>) -> Result<()> {
    let paths = args
        .get("paths")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("touch: expected `paths` to be an array of strings"))?;

    for value in paths {
        let raw = value
            .as_str()
            .ok_or_else(|| anyhow!("touch: non-string entry in `paths`: {value}"))?;
        let path = match index {
            Some(i) => PathBuf::from(raw.replace("{index}", &i.to_string())),
            None => PathBuf::from(raw),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("touching {:?}", path))?;
        debug!(path = ?path, "touched");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn registered_handler_is_callable() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut registry = HandlerRegistry::new();
        registry.register("record", move |_args, index| {
            sink.lock().unwrap().push(index);
            Ok(())
        });

        let handler = registry.get("record").unwrap();
        handler(&toml::Table::new(), Some(2)).unwrap();

        assert!(registry.contains("record"));
        assert!(!registry.contains("touch"));
        assert_eq!(*seen.lock().unwrap(), vec![Some(2)]);
    }

    #[test]
    fn touch_substitutes_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = toml::Table::new();
        args.insert(
            "paths".into(),
            toml::Value::Array(vec![toml::Value::String(format!(
                "{}/out/part-{{index}}.txt",
                dir.path().display()
            ))]),
        );

        touch(&args, Some(5)).unwrap();

        assert!(dir.path().join("out/part-5.txt").is_file());
    }

    #[test]
    fn touch_rejects_missing_paths() {
        assert!(touch(&toml::Table::new(), None).is_err());
    }
}
