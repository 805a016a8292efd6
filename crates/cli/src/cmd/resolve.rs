use std::path::Path;
use std::sync::Arc;

use scorevault_core::embed::{EmbedContext, EmbedHost, FileEmbedRenderer, parse_link};
use scorevault_core::formats::MUSICXML_CAPABILITY;

use super::{load_config, open};

/// Extensions rendered by the optional MusicXML viewer.
const MUSICXML_EXTENSIONS: [&str; 2] = ["mxl", "musicxml"];

pub fn run(
    config: Option<&Path>,
    profile: Option<&str>,
    link: &str,
    capabilities: &[String],
    json: bool,
) {
    let rc = load_config(config, profile);
    let service = open(&rc);

    let host = Arc::new(EmbedHost::new());
    for name in rc.capabilities.iter().chain(capabilities) {
        install(&host, name);
    }
    let _registration = service.register_embed(&host);

    let (file, subpath) = parse_link(link);
    let mut ctx = EmbedContext::new(link, "");
    let embed = host.render(&mut ctx, file, subpath);

    if json {
        let value = serde_json::json!({
            "link": link,
            "embed": embed,
            "classes": ctx.container.classes(),
        });
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    match embed {
        Some(embed) => {
            println!("renderer: {}", embed.renderer);
            println!("file: {}", embed.file);
            if let Some(subpath) = &embed.subpath {
                println!("subpath: {subpath}");
            }
        }
        None => println!("(nothing to embed for {file})"),
    }
}

fn install(host: &EmbedHost, name: &str) {
    if name == MUSICXML_CAPABILITY {
        host.install_capability(
            name,
            &MUSICXML_EXTENSIONS,
            Arc::new(FileEmbedRenderer::new("musicxml")),
        );
    } else {
        host.install_capability(name, &[], Arc::new(FileEmbedRenderer::new(name)));
    }
}
