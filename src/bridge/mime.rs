//! Content types for uploaded distributables

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for an artifact, from its extension
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        "exe" | "dll" => "application/x-msdownload",
        "msi" => "application/x-msi",
        "appx" | "msix" => "application/appx",
        "nupkg" | "zip" => "application/zip",
        "dmg" => "application/x-apple-diskimage",
        "pkg" => "application/vnd.apple.installer+xml",
        "deb" => "application/vnd.debian.binary-package",
        "rpm" => "application/x-rpm",
        "appimage" => "application/x-executable",
        "snap" => "application/vnd.snap",
        "flatpak" => "application/vnd.flatpak",
        "gz" | "tgz" => "application/gzip",
        "xz" => "application/x-xz",
        "bz2" => "application/x-bzip2",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "json" => "application/json",
        "yml" | "yaml" => "text/yaml",
        "txt" | "sha256" | "sha512" => "text/plain",
        "asc" | "sig" => "application/pgp-signature",
        _ => OCTET_STREAM,
    }
}
