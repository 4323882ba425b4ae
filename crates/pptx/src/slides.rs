//! Slide cloning and package relinking.
//!
//! Cloning the template slide copies its XML part and relationship
//! file, then registers the copy in three places: the content types,
//! the presentation relationships, and the slide id list. Media
//! relationships in the copied .rels keep their original targets, so
//! embedded pictures stay valid without duplicating image binaries.

use std::io::{Read, Seek};

use deck_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::package::{
    extract_number, parse_relationships, write_relationships, Relationship, TemplatePackage,
};

/// Relationship type for a slide part.
const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

/// Content type for a slide part.
const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

impl<R: Read + Seek> TemplatePackage<R> {
    /// Clone the template slide (the first slide in presentation
    /// order), returning the new slide's part path.
    pub fn clone_template_slide(&mut self) -> Result<String> {
        let template_path = self
            .slide_paths
            .first()
            .cloned()
            .ok_or_else(|| Error::PptxParseError("template has no slides".to_string()))?;

        let slide_xml = self.part_text(&template_path)?;
        let new_number = self.next_slide_number();
        let new_path = format!("ppt/slides/slide{}.xml", new_number);

        self.set_part(new_path.clone(), slide_xml.into_bytes());
        self.clone_slide_rels(&template_path, &new_path)?;
        self.register_content_type(&new_path)?;
        let rid = self.register_presentation_relationship(&new_path)?;
        self.register_slide_id(&rid)?;

        log::debug!("Cloned '{}' as '{}' ({})", template_path, new_path, rid);

        self.slide_paths.push(new_path.clone());
        Ok(new_path)
    }

    /// First unused slide part number.
    ///
    /// Counts every `ppt/slides/slideN.xml` in the archive and the
    /// edited set, not just the rels-referenced ones: decks that had
    /// slides deleted keep orphan slide parts in the package, and a
    /// clone must not overwrite them.
    fn next_slide_number(&self) -> usize {
        let archive_parts = self.archive.file_names().filter(|name| is_slide_part(name));
        let edited_parts = self
            .edited
            .keys()
            .map(|name| name.as_str())
            .filter(|name| is_slide_part(name));

        archive_parts
            .chain(edited_parts)
            .filter_map(extract_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Copy the template slide's .rels, dropping notesSlide entries so
    /// clones do not share the template's speaker notes.
    fn clone_slide_rels(&mut self, template_path: &str, new_path: &str) -> Result<()> {
        let template_rels_path = rels_path_for(template_path);
        let rels_xml = match self.part_text(&template_rels_path) {
            Ok(xml) => xml,
            // A slide without relationships is legal (no layout ref,
            // no media); nothing to copy.
            Err(Error::CorruptedFile(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        let kept: Vec<Relationship> = parse_relationships(&rels_xml)?
            .into_iter()
            .filter(|rel| !rel.rel_type.ends_with("/notesSlide"))
            .collect();

        let new_rels_path = rels_path_for(new_path);
        self.set_part(new_rels_path, write_relationships(&kept).into_bytes());
        Ok(())
    }

    /// Add a content-type override for the new slide part, unless the
    /// package already declares one for that part name.
    fn register_content_type(&mut self, new_path: &str) -> Result<()> {
        let part_name = format!("PartName=\"/{}\"", new_path);
        if self.content_types.contains(&part_name) {
            return Ok(());
        }
        let entry = format!(
            "<Override {} ContentType=\"{}\"/>",
            part_name, SLIDE_CONTENT_TYPE
        );
        self.content_types = insert_before(&self.content_types, "</Types>", &entry)
            .ok_or_else(|| {
                Error::CorruptedFile("[Content_Types].xml has no closing </Types>".to_string())
            })?;
        Ok(())
    }

    /// Add the new slide to the presentation relationships, returning
    /// the assigned rId.
    fn register_presentation_relationship(&mut self, new_path: &str) -> Result<String> {
        let relationships = parse_relationships(&self.presentation_rels)?;
        let next = relationships
            .iter()
            .filter_map(|rel| extract_number(&rel.id))
            .max()
            .unwrap_or(0)
            + 1;
        let rid = format!("rId{}", next);

        // Presentation-relationship targets are relative to ppt/.
        let target = new_path.strip_prefix("ppt/").unwrap_or(new_path);
        let entry = format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>",
            rid, SLIDE_REL_TYPE, target
        );
        self.presentation_rels = insert_before(&self.presentation_rels, "</Relationships>", &entry)
            .ok_or_else(|| {
                Error::CorruptedFile(
                    "presentation.xml.rels has no closing </Relationships>".to_string(),
                )
            })?;
        Ok(rid)
    }

    /// Append a `<p:sldId>` for the new slide to the slide id list.
    fn register_slide_id(&mut self, rid: &str) -> Result<()> {
        let new_id = max_slide_id(&self.presentation_xml)?.max(255) + 1;
        let entry = format!("<p:sldId id=\"{}\" r:id=\"{}\"/>", new_id, rid);
        self.presentation_xml = insert_before(&self.presentation_xml, "</p:sldIdLst>", &entry)
            .ok_or_else(|| {
                Error::PptxParseError("presentation.xml has no slide id list".to_string())
            })?;
        Ok(())
    }
}

/// Whether an archive path is a slide part (`ppt/slides/slideN.xml`).
fn is_slide_part(name: &str) -> bool {
    name.strip_prefix("ppt/slides/slide")
        .map(|rest| rest.ends_with(".xml") && !rest.contains('/'))
        .unwrap_or(false)
}

/// Relationship part path for a slide part
/// (`ppt/slides/slide1.xml` → `ppt/slides/_rels/slide1.xml.rels`).
fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Insert text immediately before the first occurrence of a marker.
fn insert_before(haystack: &str, marker: &str, insertion: &str) -> Option<String> {
    let pos = haystack.find(marker)?;
    let mut out = String::with_capacity(haystack.len() + insertion.len());
    out.push_str(&haystack[..pos]);
    out.push_str(insertion);
    out.push_str(&haystack[pos..]);
    Some(out)
}

/// Largest slide id used in `p:sldIdLst`.
fn max_slide_id(presentation_xml: &str) -> Result<u32> {
    let mut reader = Reader::from_str(presentation_xml);
    reader.trim_text(true);
    let mut max_id = 0u32;

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref().ends_with(b"sldId") =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"id" {
                        if let Ok(id) = String::from_utf8_lossy(&attr.value).parse::<u32>() {
                            max_id = max_id.max(id);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(max_id)
}
