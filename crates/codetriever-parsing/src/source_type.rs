//! Source types and file-extension-based reader routing (§4.3, §4.9).

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// What kind of source a `TextInput`/chunk originated from.
///
/// Binary-format variants (`LocalPdfFile`/`LocalDocxFile`/`LocalPptxFile`)
/// are recognized for routing but have no Reader implementation in this
/// repository — extraction for those formats is an external collaborator
/// behind the `Reader` trait (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    LocalTextFile,
    LocalPdfFile,
    LocalDocxFile,
    LocalPptxFile,
    LocalHtmlFile,
    YoutubeTranscription,
    LocalAudioFile,
    UserQuery,
}

impl SourceType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalTextFile => "LOCAL_TEXT_FILE",
            Self::LocalPdfFile => "LOCAL_PDF_FILE",
            Self::LocalDocxFile => "LOCAL_DOCX_FILE",
            Self::LocalPptxFile => "LOCAL_PPTX_FILE",
            Self::LocalHtmlFile => "LOCAL_HTML_FILE",
            Self::YoutubeTranscription => "YOUTUBE_TRANSCRIPTION",
            Self::LocalAudioFile => "LOCAL_AUDIO_FILE",
            Self::UserQuery => "user_query",
        }
    }
}

static EXTENSION_SOURCE_TYPES: Lazy<HashMap<&'static str, SourceType>> = Lazy::new(|| {
    HashMap::from([
        ("pdf", SourceType::LocalPdfFile),
        ("docx", SourceType::LocalDocxFile),
        ("pptx", SourceType::LocalPptxFile),
        ("ppsx", SourceType::LocalPptxFile),
        ("pptm", SourceType::LocalPptxFile),
        ("txt", SourceType::LocalTextFile),
        ("html", SourceType::LocalHtmlFile),
        ("htm", SourceType::LocalHtmlFile),
    ])
});

/// Extension (without the dot, lowercased) a given path would route to.
/// Unknown extensions default to `LocalTextFile`, matching the original
/// reader factory's unknown-extension fallback.
#[must_use]
pub fn source_type_for_path(path: &Path) -> SourceType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some(ext) => EXTENSION_SOURCE_TYPES
            .get(ext)
            .copied()
            .unwrap_or(SourceType::LocalTextFile),
        None => SourceType::LocalTextFile,
    }
}

/// True if this extension (without the dot) is one of the configured
/// audio extensions and should be routed to the download/transcription
/// pipeline instead of a text Reader (§4.9).
#[must_use]
pub fn is_audio_extension(ext: &str) -> bool {
    codetriever_config::constants::audio_file_extensions()
        .iter()
        .any(|configured| configured.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn routes_known_extensions() {
        assert_eq!(
            source_type_for_path(&PathBuf::from("doc.pdf")),
            SourceType::LocalPdfFile
        );
        assert_eq!(
            source_type_for_path(&PathBuf::from("page.html")),
            SourceType::LocalHtmlFile
        );
        assert_eq!(
            source_type_for_path(&PathBuf::from("notes.txt")),
            SourceType::LocalTextFile
        );
    }

    #[test]
    fn unknown_extension_defaults_to_text() {
        assert_eq!(
            source_type_for_path(&PathBuf::from("README.md")),
            SourceType::LocalTextFile
        );
        assert_eq!(
            source_type_for_path(&PathBuf::from("no_extension")),
            SourceType::LocalTextFile
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(
            source_type_for_path(&PathBuf::from("DOC.PDF")),
            SourceType::LocalPdfFile
        );
    }

    #[test]
    fn audio_extension_check_matches_configured_list() {
        assert!(is_audio_extension("mp3"));
        assert!(is_audio_extension("WAV"));
        assert!(!is_audio_extension("txt"));
    }
}
