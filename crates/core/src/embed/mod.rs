//! Rendering links to MuseScore files as embedded exports.
//!
//! Hosts keep a registry of embed renderers keyed by file extension. The
//! [`EmbedResolver`] is registered for the MuseScore extensions and hands each
//! link over to the renderer of the export format that fits it best.

mod host;
mod resolver;
mod types;

pub use host::{Capabilities, EmbedHost, EmbedRegistration, EmbedRegistry, FileEmbedRenderer};
pub use resolver::{EMBED_MARKER_CLASS, EmbedResolver, Resolution, parse_link};
pub use types::{Embed, EmbedContainer, EmbedContext, EmbedRenderer};
