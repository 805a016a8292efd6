use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::types::{Embed, EmbedContext, EmbedRenderer};
use crate::formats::extension_of;

/// Embed renderers keyed by file extension.
#[derive(Default)]
pub struct EmbedRegistry {
    by_extension: HashMap<String, Arc<dyn EmbedRenderer>>,
}

impl EmbedRegistry {
    pub fn register_extension(&mut self, extension: &str, renderer: Arc<dyn EmbedRenderer>) {
        self.by_extension.insert(extension.to_string(), renderer);
    }

    pub fn register_extensions(&mut self, extensions: &[&str], renderer: Arc<dyn EmbedRenderer>) {
        for extension in extensions {
            self.register_extension(extension, Arc::clone(&renderer));
        }
    }

    pub fn unregister_extension(&mut self, extension: &str) {
        self.by_extension.remove(extension);
    }

    pub fn unregister_extensions(&mut self, extensions: &[&str]) {
        for extension in extensions {
            self.unregister_extension(extension);
        }
    }

    pub fn is_extension_registered(&self, extension: &str) -> bool {
        self.by_extension.contains_key(extension)
    }

    pub fn renderer(&self, extension: &str) -> Option<Arc<dyn EmbedRenderer>> {
        self.by_extension.get(extension).cloned()
    }

    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }
}

impl fmt::Debug for EmbedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedRegistry").field("extensions", &self.extensions()).finish()
    }
}

/// Renderer that embeds the file itself, passing the subpath through.
#[derive(Debug, Clone)]
pub struct FileEmbedRenderer {
    name: String,
}

impl FileEmbedRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EmbedRenderer for FileEmbedRenderer {
    fn render(&self, _ctx: &mut EmbedContext, file: &str, subpath: Option<&str>) -> Option<Embed> {
        Some(Embed {
            renderer: self.name.clone(),
            file: file.to_string(),
            subpath: subpath.map(ToOwned::to_owned),
        })
    }
}

/// What the host offers besides its own renderers.
pub trait Capabilities: Send + Sync {
    /// Whether an optional component with this name is installed.
    fn has_capability(&self, name: &str) -> bool;

    /// The renderer currently registered for an extension.
    fn renderer(&self, extension: &str) -> Option<Arc<dyn EmbedRenderer>>;
}

/// An embedding host: a renderer registry plus the set of installed
/// optional components. PDF rendering is built in.
pub struct EmbedHost {
    registry: RwLock<EmbedRegistry>,
    capabilities: RwLock<HashSet<String>>,
}

impl Default for EmbedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbedHost {
    pub fn new() -> Self {
        let mut registry = EmbedRegistry::default();
        registry.register_extension("pdf", Arc::new(FileEmbedRenderer::new("pdf")));

        Self { registry: RwLock::new(registry), capabilities: RwLock::new(HashSet::new()) }
    }

    /// Install an optional component that renders the given extensions.
    pub fn install_capability(
        &self,
        name: &str,
        extensions: &[&str],
        renderer: Arc<dyn EmbedRenderer>,
    ) {
        self.capabilities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_extensions(extensions, renderer);
        debug!(capability = name, ?extensions, "installed capability");
    }

    /// Register a renderer until the returned guard is dropped.
    pub fn register(
        self: &Arc<Self>,
        extensions: &[&str],
        renderer: Arc<dyn EmbedRenderer>,
    ) -> EmbedRegistration {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_extensions(extensions, renderer);

        EmbedRegistration {
            host: Arc::clone(self),
            extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    pub fn is_extension_registered(&self, extension: &str) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_extension_registered(extension)
    }

    /// Render a link to `file` with whatever renderer owns its extension.
    pub fn render(
        &self,
        ctx: &mut EmbedContext,
        file: &str,
        subpath: Option<&str>,
    ) -> Option<Embed> {
        let renderer = Capabilities::renderer(self, extension_of(file)?)?;
        renderer.render(ctx, file, subpath)
    }
}

impl Capabilities for EmbedHost {
    fn has_capability(&self, name: &str) -> bool {
        self.capabilities.read().unwrap_or_else(PoisonError::into_inner).contains(name)
    }

    fn renderer(&self, extension: &str) -> Option<Arc<dyn EmbedRenderer>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner).renderer(extension)
    }
}

impl fmt::Debug for EmbedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedHost")
            .field("registry", &self.registry)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Keeps renderers registered; unregisters them when dropped.
pub struct EmbedRegistration {
    host: Arc<EmbedHost>,
    extensions: Vec<String>,
}

impl EmbedRegistration {
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Drop for EmbedRegistration {
    fn drop(&mut self) {
        let mut registry = self.host.registry.write().unwrap_or_else(PoisonError::into_inner);
        for extension in &self.extensions {
            registry.unregister_extension(extension);
        }
    }
}
