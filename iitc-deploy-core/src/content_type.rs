//! Content-type and content-encoding guessing from file names.

/// Content metadata derived from a file name. Fixed once the node is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
}

const ENCODINGS: &[(&str, &str)] = &[
    ("gz", "gzip"),
    ("bz2", "bzip2"),
    ("xz", "xz"),
    ("br", "br"),
    ("Z", "compress"),
];

const TYPES: &[(&str, &str)] = &[
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("xml", "application/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("webp", "image/webp"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("apk", "application/vnd.android.package-archive"),
    ("pdf", "application/pdf"),
];

/// Guess content type and encoding for `file_name`.
///
/// A compression suffix (`foo.js.gz`) becomes the content encoding and the
/// type is looked up on what remains. Dotfiles and names without an extension
/// have no type.
pub fn guess(file_name: &str) -> FileInfo {
    let mut stem = file_name;
    let mut content_encoding = None;

    if let Some((rest, ext)) = split_extension(stem) {
        if let Some((_, encoding)) = ENCODINGS.iter().find(|(e, _)| *e == ext) {
            content_encoding = Some(encoding.to_string());
            stem = rest;
        }
    }

    let content_type = split_extension(stem).and_then(|(_, ext)| {
        let ext = ext.to_ascii_lowercase();
        TYPES
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, t)| t.to_string())
    });

    FileInfo {
        content_type,
        content_encoding,
    }
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let (rest, ext) = name.rsplit_once('.')?;
    if rest.is_empty() || ext.is_empty() {
        return None;
    }
    Some((rest, ext))
}
