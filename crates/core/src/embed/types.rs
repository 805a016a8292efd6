use serde::Serialize;

/// Element an embed is rendered into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedContainer {
    classes: Vec<String>,
}

impl EmbedContainer {
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Where and how a link is being embedded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbedContext {
    /// Link text as written, e.g. `Song.mscz#Chorus`.
    pub linktext: String,
    /// Vault path of the note containing the link.
    pub source_path: String,
    /// Nesting depth of embeds within embeds.
    pub depth: u32,
    pub display_mode: bool,
    pub container: EmbedContainer,
}

impl EmbedContext {
    pub fn new(linktext: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self { linktext: linktext.into(), source_path: source_path.into(), ..Self::default() }
    }
}

/// A rendered embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    /// Name of the renderer that produced it.
    pub renderer: String,
    /// Vault path of the embedded file.
    pub file: String,
    pub subpath: Option<String>,
}

/// Renders a file of one particular type.
pub trait EmbedRenderer: Send + Sync {
    /// `None` means nothing is rendered for this link.
    fn render(&self, ctx: &mut EmbedContext, file: &str, subpath: Option<&str>) -> Option<Embed>;
}
