//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use canvas_router::config::SiteSettings;
use canvas_router::render::{CanvasVerdict, Registry, Sentinel, Verdict};
use tempfile::TempDir;

/// A site laid out on disk in a temporary directory.
pub struct SiteDir {
    dir: TempDir,
}

impl SiteDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("site")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("site")
    }

    /// Write `<site>/template/<name>.html`.
    pub fn template(&self, name: &str, body: &str) -> &Self {
        write(&self.root().join("template").join(format!("{name}.html")), body.as_bytes());
        self
    }

    /// Write `<site>/canvas/<name>.html`.
    pub fn canvas(&self, name: &str, body: &str) -> &Self {
        write(&self.root().join("canvas").join(format!("{name}.html")), body.as_bytes());
        self
    }

    /// Module directory for `name`, created on demand.
    pub fn module_dir(&self, name: &str) -> PathBuf {
        let dir = self.dir.path().join("modules").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write a file under `<module>/public/`.
    pub fn module_asset(&self, module: &str, rel: &str, bytes: &[u8]) -> &Self {
        write(&self.module_dir(module).join("public").join(rel), bytes);
        self
    }

    /// Live settings rooted at this directory.
    pub fn settings(&self) -> SiteSettings {
        SiteSettings {
            live: true,
            root: self.root().to_string_lossy().into_owned(),
            ..SiteSettings::default()
        }
    }
}

fn write(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// Settings for a site that exists only in memory.
pub fn memory_settings() -> SiteSettings {
    SiteSettings {
        live: true,
        root: "/nonexistent/site".into(),
        ..SiteSettings::default()
    }
}

/// Registry with an `html` canvas and templates covering every outcome.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .canvas("html", |_, out| {
            out.push_str("<html>%content%</html>");
            CanvasVerdict::Accept
        })
        .canvas("raw", |ctx, out| {
            out.push_str("raw:");
            out.push_str(ctx.path);
            CanvasVerdict::Accept
        })
        .canvas("broken", |_, out| {
            out.push_str("<broken>%content%</broken>");
            CanvasVerdict::Raise {
                message: "canvas exploded".into(),
                code: 42,
            }
        })
        .template("ok", |ctx, out| {
            out.push_str("ok ");
            out.push_str(ctx.path);
            Verdict::Accept
        })
        .template("secret", |_, out| {
            out.push_str("secret output");
            Verdict::Accept
        })
        .template("reject", |_, out| {
            out.push_str("rejected output");
            Verdict::Reject(Sentinel::Code(0))
        })
        .template("forbidden", |_, _| Verdict::Reject(Sentinel::Forbidden));
    registry
}
