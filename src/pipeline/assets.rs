//! Filesystem operations of the clean, copy-assets and emit steps

use crate::core::context::BuildContext;
use crate::core::report::{Artifact, ArtifactKind};
use crate::toolchain::CompiledModule;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Errors from copying, rewriting or cleaning build files
#[derive(Debug, Error)]
pub enum AssetError {
    /// The configured static directory does not exist
    #[error("static directory not found: {}", path.display())]
    MissingStaticDir { path: PathBuf },

    /// The HTML entry is missing from the static directory
    #[error("HTML entry not found: {}", path.display())]
    MissingHtmlEntry { path: PathBuf },

    /// Walking the static directory failed
    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A single file operation failed
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Empty the output directory, creating it if it does not exist
///
/// Idempotent: cleaning an empty or missing directory is a no-op. The
/// directory itself is kept so later steps can write into it without
/// re-creating it.
pub fn clean_output(dir: &Path) -> Result<(), AssetError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| AssetError::Io {
            action: "create",
            path: dir.to_path_buf(),
            source,
        })?;
        return Ok(());
    }

    let entries = fs::read_dir(dir).map_err(|source| AssetError::Io {
        action: "read",
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| AssetError::Io {
            action: "read",
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let removal = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|source| AssetError::Io {
            action: "remove",
            path,
            source,
        })?;
    }

    debug!("Cleaned output directory {}", dir.display());
    Ok(())
}

/// Copy the static directory into the output and rewrite the HTML entry
///
/// Everything under the static directory, including nested asset
/// directories, is copied verbatim. The HTML entry is the exception: its
/// placeholder references are replaced with the stamped stylesheet and
/// script names before the file is written. A missing static directory
/// or HTML entry is fatal; an absent nested assets directory is not.
pub fn copy_static_assets(
    ctx: &BuildContext,
    css_placeholder: &str,
    js_placeholder: &str,
) -> Result<Vec<Artifact>, AssetError> {
    let static_dir = &ctx.static_dir;
    if !static_dir.is_dir() {
        return Err(AssetError::MissingStaticDir {
            path: static_dir.clone(),
        });
    }

    let html_source = static_dir.join(&ctx.html_entry);
    if !html_source.is_file() {
        return Err(AssetError::MissingHtmlEntry { path: html_source });
    }

    let mut artifacts = Vec::new();

    for entry in WalkDir::new(static_dir).follow_links(false) {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: static_dir.clone(),
            source,
        })?;
        let rel = match entry.path().strip_prefix(static_dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let dest = ctx.output_dir.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|source| AssetError::Io {
                action: "create",
                path: dest.clone(),
                source,
            })?;
            continue;
        }

        // The HTML entry is rewritten below, not copied verbatim.
        if rel == Path::new(&ctx.html_entry) {
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| AssetError::Io {
                action: "create",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(entry.path(), &dest).map_err(|source| AssetError::Io {
            action: "copy",
            path: dest.clone(),
            source,
        })?;
        artifacts.push(Artifact::new(ArtifactKind::Static, dest));
    }

    let contents = fs::read_to_string(&html_source).map_err(|source| AssetError::Io {
        action: "read",
        path: html_source.clone(),
        source,
    })?;
    let rewritten = rewrite_html(
        &contents,
        css_placeholder,
        js_placeholder,
        &ctx.stylesheet_name(),
        &ctx.script_name(),
    );
    let html_dest = ctx.output_dir.join(&ctx.html_entry);
    fs::write(&html_dest, rewritten).map_err(|source| AssetError::Io {
        action: "write",
        path: html_dest.clone(),
        source,
    })?;
    artifacts.push(Artifact::new(ArtifactKind::Html, html_dest));

    Ok(artifacts)
}

/// Replace the placeholder references with the stamped file names
///
/// The substitution is plain text, not a pattern: a placeholder matches
/// only its exact characters.
pub fn rewrite_html(
    contents: &str,
    css_placeholder: &str,
    js_placeholder: &str,
    stylesheet_name: &str,
    script_name: &str,
) -> String {
    contents
        .replace(css_placeholder, stylesheet_name)
        .replace(js_placeholder, script_name)
}

/// Write the stamped bundle files into the output directory
///
/// Always writes the script; writes the source map sibling (and appends
/// the `sourceMappingURL` comment) when maps are enabled and present,
/// and the stylesheet when the compile step extracted any styles.
pub fn write_bundle(
    module: &CompiledModule,
    ctx: &mut BuildContext,
    sourcemap: bool,
) -> Result<(), AssetError> {
    let mut script = module.script.clone();

    if sourcemap {
        if let Some(map) = &module.source_map {
            let map_name = ctx.source_map_name();
            script.push_str(&format!("\n//# sourceMappingURL={}\n", map_name));
            let map_path = ctx.output_dir.join(&map_name);
            fs::write(&map_path, map).map_err(|source| AssetError::Io {
                action: "write",
                path: map_path.clone(),
                source,
            })?;
            ctx.record_artifact(Artifact::new(ArtifactKind::SourceMap, map_path));
        }
    }

    let script_path = ctx.output_dir.join(ctx.script_name());
    fs::write(&script_path, script).map_err(|source| AssetError::Io {
        action: "write",
        path: script_path.clone(),
        source,
    })?;
    ctx.record_artifact(Artifact::new(ArtifactKind::Script, script_path));

    if let Some(styles) = &module.styles {
        let css_path = ctx.output_dir.join(ctx.stylesheet_name());
        fs::write(&css_path, styles).map_err(|source| AssetError::Io {
            action: "write",
            path: css_path.clone(),
            source,
        })?;
        ctx.record_artifact(Artifact::new(ArtifactKind::Stylesheet, css_path));
    }

    Ok(())
}
