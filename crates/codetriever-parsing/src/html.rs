//! HTML reader: chunked inner text with positions into the raw markup
//! (§4.3).
//!
//! Unlike the plain-text reader, canonical text here is the *raw* HTML
//! (`read()`), while chunked text (`read_iter()`) is the cleaned inner
//! text of each node. A direct single-pass scan tracks byte ranges as it
//! walks the markup, so every text run's position is known exactly as it
//! is found — there is no separate search-then-verify-not-inside-a-tag
//! step, since the scanner can only ever be "in text" outside of a tag.

use crate::chunk::{TextChunk, split_text_chunk};
use crate::error::ParsingResult;
use crate::reader::Reader;
use crate::source_type::SourceType;
use std::path::{Path, PathBuf};

pub struct HtmlReader {
    path: PathBuf,
    chunk_size_max: usize,
}

impl HtmlReader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, chunk_size_max: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size_max,
        }
    }
}

impl Reader for HtmlReader {
    fn source_type(&self) -> SourceType {
        SourceType::LocalHtmlFile
    }

    fn read(&self) -> ParsingResult<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn read_iter(&self) -> ParsingResult<Vec<TextChunk>> {
        let html = self.read()?;
        let mut out = Vec::new();
        for (start, end) in extract_text_byte_ranges(&html) {
            let cleaned = collapse_whitespace(&html[start..end]);
            if cleaned.is_empty() {
                continue;
            }
            let html_chunk = TextChunk {
                start_index: start,
                end_index: end,
                text: cleaned,
            };
            out.extend(split_html_chunk(self.chunk_size_max, html_chunk));
        }
        Ok(out)
    }
}

/// Byte ranges `(start, end)` of raw text runs in `html`, skipping tags,
/// comments, and the contents of `<script>`/`<style>` elements.
fn extract_text_byte_ranges(html: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut text_start: Option<usize> = None;
    let mut skip_tag: Option<String> = None;
    let mut i = 0usize;
    let len = html.len();

    let flush = |ranges: &mut Vec<(usize, usize)>, text_start: &mut Option<usize>, end: usize| {
        if let Some(start) = text_start.take() {
            if end > start {
                ranges.push((start, end));
            }
        }
    };

    while i < len {
        let rest = &html[i..];
        if rest.starts_with("<!--") {
            flush(&mut ranges, &mut text_start, i);
            i += match rest.find("-->") {
                Some(pos) => pos + 3,
                None => len - i,
            };
            continue;
        }

        if rest.as_bytes()[0] == b'<' {
            flush(&mut ranges, &mut text_start, i);
            match rest.find('>') {
                Some(close) => {
                    let tag_inner = &rest[1..close];
                    let is_closing = tag_inner.starts_with('/');
                    let name_part = tag_inner.trim_start_matches('/');
                    let tag_name = name_part
                        .split(|c: char| c.is_whitespace() || c == '/')
                        .next()
                        .unwrap_or("")
                        .to_ascii_lowercase();

                    match &skip_tag {
                        Some(skipping) if is_closing && tag_name == *skipping => {
                            skip_tag = None;
                        }
                        Some(_) => {}
                        None if !is_closing && (tag_name == "script" || tag_name == "style") => {
                            skip_tag = Some(tag_name);
                        }
                        None => {}
                    }

                    i += close + 1;
                }
                None => i = len,
            }
            continue;
        }

        if skip_tag.is_none() && text_start.is_none() {
            text_start = Some(i);
        }
        let step = rest.chars().next().map_or(1, char::len_utf8);
        i += step;
    }

    flush(&mut ranges, &mut text_start, len);
    ranges
}

fn collapse_whitespace(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Like [`split_text_chunk`], but apportions the HTML byte span
/// proportionally to the cleaned text's character positions, since HTML
/// tags don't map one-to-one onto cleaned text characters.
fn split_html_chunk(chunk_size_max: usize, chunk: TextChunk) -> Vec<TextChunk> {
    let text_len = chunk.text.chars().count();
    if text_len <= chunk_size_max {
        return vec![chunk];
    }

    let html_span = chunk.end_index - chunk.start_index;
    let html_start = chunk.start_index;
    let pieces = split_text_chunk(
        chunk_size_max,
        TextChunk {
            start_index: 0,
            end_index: text_len,
            text: chunk.text,
        },
    );

    pieces
        .into_iter()
        .map(|piece| {
            let start_ratio = piece.start_index as f64 / text_len as f64;
            let end_ratio = piece.end_index as f64 / text_len as f64;
            TextChunk {
                start_index: html_start + (start_ratio * html_span as f64) as usize,
                end_index: html_start + (end_ratio * html_span as f64) as usize,
                text: piece.text,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_html(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn extracts_text_nodes_skipping_tags() {
        let html = "<html><body><p>Hello world</p></body></html>";
        let file = write_html(html);
        let reader = HtmlReader::new(file.path(), 1000);
        let chunks = reader.read_iter().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world");
        assert_eq!(&html[chunks[0].start_index..chunks[0].end_index], "Hello world");
    }

    #[test]
    fn skips_script_and_style_contents() {
        let html = "<html><head><style>body{color:red}</style><script>var x = 1;</script></head><body><p>Visible</p></body></html>";
        let file = write_html(html);
        let reader = HtmlReader::new(file.path(), 1000);
        let chunks = reader.read_iter().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Visible");
    }

    #[test]
    fn skips_comments() {
        let html = "<p>Before<!-- a comment with <p>fake tag</p> inside -->After</p>";
        let file = write_html(html);
        let reader = HtmlReader::new(file.path(), 1000);
        let chunks = reader.read_iter().unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Before", "After"]);
    }

    #[test]
    fn collapses_internal_whitespace_and_newlines() {
        let html = "<p>  line one\n   line two  </p>";
        let file = write_html(html);
        let reader = HtmlReader::new(file.path(), 1000);
        let chunks = reader.read_iter().unwrap();
        assert_eq!(chunks[0].text, "line one line two");
    }

    #[test]
    fn long_text_node_is_split_with_proportional_html_indices() {
        let words = "word ".repeat(80);
        let html = format!("<p>{words}</p>");
        let file = write_html(&html);
        let reader = HtmlReader::new(file.path(), 20);
        let chunks = reader.read_iter().unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.start_index < chunk.end_index);
            assert!(chunk.end_index <= html.len());
        }
    }

    #[test]
    fn empty_element_produces_no_chunks() {
        let html = "<div><span></span></div>";
        let file = write_html(html);
        let reader = HtmlReader::new(file.path(), 1000);
        let chunks = reader.read_iter().unwrap();
        assert!(chunks.is_empty());
    }
}
