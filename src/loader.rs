//! Document loading: raw upload bytes to text segments.
//!
//! Dispatches on the lowercase file extension:
//!
//! | Extension | Decoder | Segments |
//! |-----------|---------|----------|
//! | `pdf` | `pdf-extract`, from a scoped temp file | one per page, `page` 0-based |
//! | `docx` | `zip` + `quick-xml` over `word/document.xml` | one, paragraphs separated by blank lines |
//! | `txt`, `md` | UTF-8 | one |
//!
//! Anything else, including legacy `.doc`, is [`Error::UnsupportedFormat`].
//!
//! The PDF decoder works on a filesystem path, so the bytes are written to a
//! [`tempfile::NamedTempFile`] named `docqa-XXXX_{basename}`. The file is
//! removed when the guard drops, on success, on decode failure and on panic.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use docqa_core::models::Segment;
use docqa_core::{Error, Result};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = extension_of(filename);
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" | "md" => Ok(Self::Text),
            _ => Err(Error::UnsupportedFormat(ext)),
        }
    }
}

/// Lowercase extension without the dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    temp_dir: Option<PathBuf>,
}

impl DocumentLoader {
    /// `temp_dir = None` uses the system temp directory.
    pub fn new(temp_dir: Option<PathBuf>) -> Self {
        Self { temp_dir }
    }

    /// Decode `bytes` into segments. Every segment carries `filename`.
    pub fn load(&self, bytes: &[u8], filename: &str) -> Result<Vec<Segment>> {
        match DocumentKind::from_filename(filename)? {
            DocumentKind::Pdf => self.load_pdf(bytes, filename),
            DocumentKind::Docx => load_docx(bytes, filename),
            DocumentKind::Text => load_text(bytes, filename),
        }
    }

    fn load_pdf(&self, bytes: &[u8], filename: &str) -> Result<Vec<Segment>> {
        let suffix = format!("_{}", sanitized_basename(filename));
        let mut builder = tempfile::Builder::new();
        builder.prefix("docqa-").suffix(&suffix);
        let mut tmp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| Error::Internal(format!("failed to create temp file: {}", e)))?;

        tmp.write_all(bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| Error::Internal(format!("failed to write temp file: {}", e)))?;

        let pages = pdf_extract::extract_text_by_pages(tmp.path())
            .map_err(|e| Error::decode(filename, format!("PDF extraction failed: {}", e)))?;

        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(i, text)| Segment::new(text, filename, Some(i as u32)))
            .collect())
    }
}

fn sanitized_basename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    base.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

fn load_text(bytes: &[u8], filename: &str) -> Result<Vec<Segment>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::decode(filename, format!("not valid UTF-8: {}", e)))?;
    Ok(vec![Segment::new(text, filename, None)])
}

fn load_docx(bytes: &[u8], filename: &str) -> Result<Vec<Segment>> {
    let ooxml = |e: String| Error::decode(filename, format!("DOCX extraction failed: {}", e));

    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ooxml(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ooxml("word/document.xml not found".to_string()))?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ooxml(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ooxml("word/document.xml exceeds size limit".to_string()));
    }

    let text = docx_paragraphs(&doc_xml).map_err(ooxml)?;
    Ok(vec![Segment::new(text, filename, None)])
}

/// Collect `w:t` runs, one paragraph per `w:p`, paragraphs joined by blank lines.
fn docx_paragraphs(xml: &[u8]) -> std::result::Result<String, String> {
    use quick_xml::events::Event;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_run = false;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            // Tab stops under w:pPr/w:tabs are layout, not content.
            Ok(Event::Empty(e)) if in_run => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => {
                    let para = std::mem::take(&mut current);
                    if !para.trim().is_empty() {
                        paragraphs.push(para);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    if !current.trim().is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn kind_is_chosen_by_lowercase_extension() {
        assert_eq!(DocumentKind::from_filename("A.PDF").unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("b.docx").unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("notes.Md").unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("c.txt").unwrap(), DocumentKind::Text);
    }

    #[test]
    fn legacy_doc_and_unknown_are_unsupported() {
        for name in ["old.doc", "sheet.xlsx", "README"] {
            let err = DocumentKind::from_filename(name).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat(_)), "{}", name);
        }
    }

    #[test]
    fn text_file_is_one_segment_without_page() {
        let segs = DocumentLoader::default().load(b"hello there", "notes.txt").unwrap();
        assert_eq!(segs, vec![Segment::new("hello there", "notes.txt", None)]);
    }

    #[test]
    fn invalid_utf8_is_decode_error() {
        let err = DocumentLoader::default()
            .load(&[0xff, 0xfe, 0x00], "bad.md")
            .unwrap_err();
        assert!(matches!(err, Error::Decode { ref filename, .. } if filename == "bad.md"));
    }

    #[test]
    fn docx_paragraphs_are_separated_by_blank_lines() {
        let bytes = docx_with_paragraphs(&["First para.", "Second &amp; last."]);
        let segs = DocumentLoader::default().load(&bytes, "memo.docx").unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].text, "First para.\n\nSecond & last.");
        assert_eq!(segs[0].filename, "memo.docx");
        assert_eq!(segs[0].page, None);
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let xml = br#"<w:document xmlns:w="w"><w:body><w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Name</w:t><w:tab/><w:t>Value</w:t><w:br/><w:t>Next</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(docx_paragraphs(xml).unwrap(), "Name\tValue\nNext");
    }

    #[test]
    fn bad_entity_in_docx_text_is_decode_error() {
        let bytes = docx_with_paragraphs(&["fish &bogus; chips"]);
        let err = DocumentLoader::default().load(&bytes, "menu.docx").unwrap_err();
        assert!(matches!(err, Error::Decode { ref filename, .. } if filename == "menu.docx"));
    }

    #[test]
    fn invalid_zip_is_decode_error() {
        let err = DocumentLoader::default().load(b"not a zip", "x.docx").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn invalid_pdf_is_decode_error_and_leaves_no_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let loader = DocumentLoader::new(Some(dir.path().to_path_buf()));
        let err = loader.load(b"not a pdf", "broken.pdf").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn basename_strips_directories_and_odd_characters() {
        assert_eq!(sanitized_basename("../../etc/pass wd.pdf"), "pass_wd.pdf");
        assert_eq!(sanitized_basename("report.pdf"), "report.pdf");
    }
}
