//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! Selection (canvas, template, parse flag)
//!     → locator.rs (site → subsite → modules → framework)
//!     → pipeline.rs (template buffer, canvas shell, composition)
//!     → body string, or a DispatchError
//! ```
//!
//! # Design Decisions
//! - Templates and canvases are trait objects; closures and files both qualify
//! - Buffers are plain values owned by the pipeline call, never shared

pub mod file;
pub mod locator;
pub mod pipeline;
pub mod resource;

pub use locator::{Origin, Registry, ResourceLocator};
pub use pipeline::{RenderPipeline, DEFAULT_CONTENT_MARKER};
pub use resource::{Canvas, CanvasVerdict, RenderContext, Sentinel, Template, Verdict, FORBIDDEN_CODE};
