use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::host::Capabilities;
use super::types::{Embed, EmbedContext, EmbedRenderer};
use crate::formats::ExportFormat;
use crate::paths::export_info;
use crate::settings::Settings;
use crate::vault::Vault;

/// Class added to the container of every rendered score embed.
pub const EMBED_MARKER_CLASS: &str = "musescore-embed";

/// Split link text into the linked path and its subpath.
///
/// `Song.mscz#Chorus|alias` yields `("Song.mscz", Some("#Chorus"))`. A bare
/// `#` counts as no subpath.
pub fn parse_link(linktext: &str) -> (&str, Option<&str>) {
    let target = linktext.split('|').next().unwrap_or(linktext);
    match target.find('#') {
        Some(idx) if idx + 1 < target.len() => (&target[..idx], Some(&target[idx..])),
        Some(idx) => (&target[..idx], None),
        None => (target, None),
    }
}

/// The export chosen to stand in for a MuseScore link.
#[derive(Clone)]
pub struct Resolution {
    pub format: ExportFormat,
    /// Vault path of the export file.
    pub file: String,
    /// Subpath handed to the renderer.
    pub subpath: Option<String>,
    /// The preferred format could not be rendered and the baseline was used.
    pub fell_back: bool,
    renderer: Arc<dyn EmbedRenderer>,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("format", &self.format)
            .field("file", &self.file)
            .field("subpath", &self.subpath)
            .field("fell_back", &self.fell_back)
            .finish_non_exhaustive()
    }
}

/// Embed renderer for MuseScore files that delegates to the renderer of an
/// export format.
pub struct EmbedResolver<V> {
    vault: Arc<V>,
    capabilities: Arc<dyn Capabilities>,
    export_root: String,
    embed_as: ExportFormat,
    embed_subpath_as: ExportFormat,
}

impl<V: Vault> EmbedResolver<V> {
    pub fn new(vault: Arc<V>, capabilities: Arc<dyn Capabilities>, settings: &Settings) -> Self {
        Self {
            vault,
            capabilities,
            export_root: settings.folder_path.clone(),
            embed_as: settings.embed_as,
            embed_subpath_as: settings.embed_subpath_as,
        }
    }

    /// Pick the export and renderer for a link to `source_path`.
    ///
    /// Returns `None` when the chosen export does not exist (yet).
    pub fn resolve(&self, source_path: &str, subpath: Option<&str>) -> Option<Resolution> {
        let subpath = subpath.filter(|s| !s.is_empty());
        let desired = if subpath.is_some() { self.embed_subpath_as } else { self.embed_as };

        let (format, subpath, renderer, fell_back) = match self.renderer_for(desired) {
            Some(renderer) => (desired, subpath, renderer, false),
            None => {
                // The baseline renderer cannot use the subpath.
                let baseline = ExportFormat::baseline();
                debug!(%desired, %baseline, "preferred embed format unavailable, falling back");
                (baseline, None, self.renderer_for(baseline)?, true)
            }
        };

        let info = export_info(&self.export_root, source_path, format);
        if self.vault.file_stat(&info.path).is_none() {
            debug!(source = source_path, export = %info.path, "no export to embed");
            return None;
        }

        Some(Resolution {
            format,
            file: info.path,
            subpath: subpath.map(ToOwned::to_owned),
            fell_back,
            renderer,
        })
    }

    fn renderer_for(&self, format: ExportFormat) -> Option<Arc<dyn EmbedRenderer>> {
        if let Some(capability) = format.required_capability()
            && !self.capabilities.has_capability(capability)
        {
            return None;
        }
        self.capabilities.renderer(format.extension())
    }
}

impl<V: Vault> EmbedRenderer for EmbedResolver<V> {
    fn render(&self, ctx: &mut EmbedContext, file: &str, subpath: Option<&str>) -> Option<Embed> {
        let resolution = self.resolve(file, subpath)?;
        let embed =
            resolution.renderer.render(ctx, &resolution.file, resolution.subpath.as_deref())?;
        ctx.container.add_class(EMBED_MARKER_CLASS);
        Some(embed)
    }
}
