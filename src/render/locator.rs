//! Resource resolution.
//!
//! # Search Order
//! ```text
//! in-memory registries (application code)
//!     → site directory
//!     → subsite directory
//!     → module directories (config order)
//!     → framework default directory
//! ```
//!
//! The first source holding a resource wins. Directory sources keep
//! templates under `template/` and canvases under `canvas/`, each as
//! `<name>.html`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::render::file::{FileCanvas, FileTemplate};
use crate::render::resource::{Canvas, CanvasVerdict, RenderContext, Template, Verdict};

const TEMPLATE_DIR: &str = "template";
const CANVAS_DIR: &str = "canvas";
const EXTENSION: &str = "html";

/// Where a source sits in the search order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Registry,
    Site,
    Subsite,
    Module(String),
    Framework,
}

impl Origin {
    fn rank(&self) -> u8 {
        match self {
            Origin::Registry => 0,
            Origin::Site => 1,
            Origin::Subsite => 2,
            Origin::Module(_) => 3,
            Origin::Framework => 4,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Registry => write!(f, "registry"),
            Origin::Site => write!(f, "site"),
            Origin::Subsite => write!(f, "subsite"),
            Origin::Module(name) => write!(f, "module:{name}"),
            Origin::Framework => write!(f, "framework"),
        }
    }
}

/// Named templates and canvases defined in code.
#[derive(Default, Clone)]
pub struct Registry {
    templates: HashMap<String, Arc<dyn Template>>,
    canvases: HashMap<String, Arc<dyn Canvas>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template closure.
    pub fn template<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&RenderContext<'_>, &mut String) -> Verdict + Send + Sync + 'static,
    {
        self.insert_template(name, Arc::new(f))
    }

    /// Register a canvas closure.
    pub fn canvas<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&RenderContext<'_>, &mut String) -> CanvasVerdict + Send + Sync + 'static,
    {
        self.insert_canvas(name, Arc::new(f))
    }

    pub fn insert_template(&mut self, name: impl Into<String>, template: Arc<dyn Template>) -> &mut Self {
        self.templates.insert(name.into(), template);
        self
    }

    pub fn insert_canvas(&mut self, name: impl Into<String>, canvas: Arc<dyn Canvas>) -> &mut Self {
        self.canvases.insert(name.into(), canvas);
        self
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .field("canvases", &self.canvases.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum SourceKind {
    Directory(PathBuf),
    Memory(Arc<Registry>),
}

#[derive(Debug, Clone)]
struct Source {
    origin: Origin,
    kind: SourceKind,
}

/// Ordered set of places templates and canvases are looked up.
#[derive(Debug, Clone, Default)]
pub struct ResourceLocator {
    sources: Vec<Source>,
    modules: Vec<(String, PathBuf)>,
}

impl ResourceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.push(Origin::Registry, SourceKind::Memory(Arc::new(registry)));
        self
    }

    pub fn site(mut self, dir: impl Into<PathBuf>) -> Self {
        self.push(Origin::Site, SourceKind::Directory(dir.into()));
        self
    }

    pub fn subsite(mut self, dir: impl Into<PathBuf>) -> Self {
        self.push(Origin::Subsite, SourceKind::Directory(dir.into()));
        self
    }

    pub fn module(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let dir = dir.into();
        self.modules.push((name.clone(), dir.clone()));
        self.push(Origin::Module(name), SourceKind::Directory(dir));
        self
    }

    pub fn framework(mut self, dir: impl Into<PathBuf>) -> Self {
        self.push(Origin::Framework, SourceKind::Directory(dir.into()));
        self
    }

    /// Keep sources sorted by origin, preserving insertion order within one rank.
    fn push(&mut self, origin: Origin, kind: SourceKind) {
        let rank = origin.rank();
        let position = self
            .sources
            .iter()
            .position(|s| s.origin.rank() > rank)
            .unwrap_or(self.sources.len());
        self.sources.insert(position, Source { origin, kind });
    }

    /// The directory of a configured module.
    pub fn module_dir(&self, name: &str) -> Option<&Path> {
        self.modules
            .iter()
            .find(|(module, _)| module == name)
            .map(|(_, dir)| dir.as_path())
    }

    /// Origins in search order.
    pub fn origins(&self) -> impl Iterator<Item = &Origin> {
        self.sources.iter().map(|s| &s.origin)
    }

    /// Find a template by name.
    pub fn template(&self, name: &str) -> io::Result<Option<Arc<dyn Template>>> {
        if !is_valid_name(name) {
            return Ok(None);
        }
        for source in &self.sources {
            let found: Option<Arc<dyn Template>> = match &source.kind {
                SourceKind::Memory(registry) => registry.templates.get(name).cloned(),
                SourceKind::Directory(dir) => read_resource(dir, TEMPLATE_DIR, name)?
                    .map(|text| Arc::new(FileTemplate::new(text)) as Arc<dyn Template>),
            };
            if found.is_some() {
                tracing::trace!(template = name, origin = %source.origin, "Template resolved");
                return Ok(found);
            }
        }
        Ok(None)
    }

    /// Find a canvas by name.
    pub fn canvas(&self, name: &str) -> io::Result<Option<Arc<dyn Canvas>>> {
        if !is_valid_name(name) {
            return Ok(None);
        }
        for source in &self.sources {
            let found: Option<Arc<dyn Canvas>> = match &source.kind {
                SourceKind::Memory(registry) => registry.canvases.get(name).cloned(),
                SourceKind::Directory(dir) => read_resource(dir, CANVAS_DIR, name)?
                    .map(|text| Arc::new(FileCanvas::new(text)) as Arc<dyn Canvas>),
            };
            if found.is_some() {
                tracing::trace!(canvas = name, origin = %source.origin, "Canvas resolved");
                return Ok(found);
            }
        }
        Ok(None)
    }
}

fn read_resource(root: &Path, kind: &str, name: &str) -> io::Result<Option<String>> {
    let path = root.join(kind).join(format!("{name}.{EXTENSION}"));
    match fs::read_to_string(&path) {
        Ok(text) => {
            tracing::trace!(file = %path.display(), "Resource file read");
            Ok(Some(text))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        // A directory with the resource's name is not a resource.
        Err(_) if path.is_dir() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Resource names are relative slash-separated paths without traversal.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['\\', '\0'])
        && name
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
