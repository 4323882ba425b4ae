//! In-memory view of a PPTX template package.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

/// Path of the content-types part.
pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
/// Path of the presentation part.
pub(crate) const PRESENTATION_PART: &str = "ppt/presentation.xml";
/// Path of the presentation relationships part.
pub(crate) const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// One `<Relationship>` entry from a .rels part.
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"` for hyperlinks and the like.
    pub target_mode: Option<String>,
}

/// A PPTX template loaded for editing.
///
/// The original archive stays available for raw-copying untouched
/// entries at write time; edited and new parts live in `edited`.
pub struct TemplatePackage<R: Read + Seek> {
    pub(crate) archive: ZipArchive<R>,
    /// Parts modified or added, keyed by archive path.
    pub(crate) edited: BTreeMap<String, Vec<u8>>,
    /// Slide part paths in presentation order.
    pub(crate) slide_paths: Vec<String>,
    pub(crate) presentation_xml: String,
    pub(crate) presentation_rels: String,
    pub(crate) content_types: String,
}

impl<R: Read + Seek> TemplatePackage<R> {
    /// Open a template package from a reader.
    pub fn open(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content_types = read_text_part(&mut archive, CONTENT_TYPES_PART)?;
        let presentation_xml = read_text_part(&mut archive, PRESENTATION_PART)?;
        let presentation_rels = read_text_part(&mut archive, PRESENTATION_RELS_PART)?;

        let relationships = parse_relationships(&presentation_rels)?;
        let slide_paths = slide_order(&relationships);

        log::debug!("Template has {} slide(s)", slide_paths.len());

        Ok(Self {
            archive,
            edited: BTreeMap::new(),
            slide_paths,
            presentation_xml,
            presentation_rels,
            content_types,
        })
    }

    /// Number of slides currently in the package.
    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Slide part paths in presentation order.
    pub fn slide_paths(&self) -> &[String] {
        &self.slide_paths
    }

    /// Read a part as text, preferring the edited copy.
    pub fn part_text(&mut self, path: &str) -> Result<String> {
        if let Some(bytes) = self.edited.get(path) {
            return String::from_utf8(bytes.clone())
                .map_err(|e| Error::XmlError(format!("Part '{}' is not UTF-8: {}", path, e)));
        }
        read_text_part(&mut self.archive, path)
    }

    /// Replace or add a part.
    pub fn set_part(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.edited.insert(path.into(), bytes);
    }
}

/// Read a text part out of the archive.
pub(crate) fn read_text_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|_| Error::CorruptedFile(format!("'{}' not found in archive", path)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Parse all `<Relationship>` entries from a .rels part.
pub(crate) fn parse_relationships(rels_xml: &str) -> Result<Vec<Relationship>> {
    let mut relationships = Vec::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut id = String::new();
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut target_mode = None;

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => id = value,
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"TargetMode" => target_mode = Some(value),
                        _ => {}
                    }
                }

                relationships.push(Relationship {
                    id,
                    rel_type,
                    target,
                    target_mode,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Serialize relationships back into a .rels part.
pub(crate) fn write_relationships(relationships: &[Relationship]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in relationships {
        xml.push_str("<Relationship Id=\"");
        xml.push_str(&escape_attr(&rel.id));
        xml.push_str("\" Type=\"");
        xml.push_str(&escape_attr(&rel.rel_type));
        xml.push_str("\" Target=\"");
        xml.push_str(&escape_attr(&rel.target));
        xml.push('"');
        if let Some(mode) = &rel.target_mode {
            xml.push_str(" TargetMode=\"");
            xml.push_str(&escape_attr(mode));
            xml.push('"');
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    xml
}

/// Escape text for use in an XML attribute value.
pub(crate) fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Order slide paths from the presentation relationships.
///
/// Slide relationships are sorted by the numeric suffix of their rId
/// (falling back to the target name), matching presentation order for
/// packages written by PowerPoint.
pub(crate) fn slide_order(relationships: &[Relationship]) -> Vec<String> {
    let mut slides: Vec<(String, Option<usize>)> = relationships
        .iter()
        .filter(|rel| {
            rel.rel_type.contains("/slide")
                && !rel.rel_type.contains("slideLayout")
                && !rel.rel_type.contains("slideMaster")
        })
        .map(|rel| {
            let order = extract_number(&rel.id).or_else(|| extract_number(&rel.target));
            let full_path = if let Some(stripped) = rel.target.strip_prefix('/') {
                stripped.to_string()
            } else {
                format!("ppt/{}", rel.target)
            };
            (full_path, order)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    slides.into_iter().map(|(path, _)| path).collect()
}

/// Extract a trailing number from a string like "rId2" or "slide3.xml".
pub(crate) fn extract_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
