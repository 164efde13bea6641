use std::path::Path;

/// Best-effort MIME type from a file extension, for files handed to the CLI
/// without an explicit `--mime`.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "mpeg" | "mpg" => "video/mpeg",
        "ogv" => "video/ogg",
        "3gp" => "video/3gpp",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_mime_video_extensions() {
        assert_eq!(guess_mime(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(guess_mime(Path::new("/tmp/Holiday.MOV")), "video/quicktime");
        assert_eq!(guess_mime(Path::new("a.b.webm")), "video/webm");
    }

    #[test]
    fn guess_mime_non_video() {
        assert_eq!(guess_mime(Path::new("photo.png")), "image/png");
        assert_eq!(guess_mime(Path::new("README")), "application/octet-stream");
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
