//! Output serialization and deck generation.

use std::collections::HashSet;
use std::io::{Read, Seek, Write};

use deck_core::normalize::unresolved_tokens;
use deck_core::{Error, FieldMapping, Result, Roster};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::package::{
    TemplatePackage, CONTENT_TYPES_PART, PRESENTATION_PART, PRESENTATION_RELS_PART,
};
use crate::substitute::substitute_slide;

/// What a deck generation run produced.
#[derive(Debug, Clone)]
pub struct DeckSummary {
    /// Teams rendered.
    pub teams: usize,
    /// Slides in the output deck.
    pub slides: usize,
    /// Placeholder tokens left unfilled anywhere in the output.
    pub unresolved: Vec<String>,
}

impl<R: Read + Seek> TemplatePackage<R> {
    /// Serialize the package to a writer.
    ///
    /// Untouched entries raw-copy straight from the template archive
    /// (no recompression); edited and new parts are deflated.
    pub fn write_to<W: Write + Seek>(&mut self, out: W) -> Result<()> {
        self.edited.insert(
            CONTENT_TYPES_PART.to_string(),
            self.content_types.clone().into_bytes(),
        );
        self.edited.insert(
            PRESENTATION_PART.to_string(),
            self.presentation_xml.clone().into_bytes(),
        );
        self.edited.insert(
            PRESENTATION_RELS_PART.to_string(),
            self.presentation_rels.clone().into_bytes(),
        );

        let mut writer = ZipWriter::new(out);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let existing: HashSet<String> =
            self.archive.file_names().map(|n| n.to_string()).collect();

        for i in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index_raw(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            let name = entry.name().to_string();

            match self.edited.get(&name) {
                Some(bytes) => {
                    drop(entry);
                    writer
                        .start_file(&name, options)
                        .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
                    writer.write_all(bytes)?;
                }
                None => {
                    writer
                        .raw_copy_file(entry)
                        .map_err(|e| Error::ZipError(format!("Failed to copy '{}': {}", name, e)))?;
                }
            }
        }

        // Parts that exist only in the edited set (cloned slides and
        // their rels).
        for (name, bytes) in &self.edited {
            if existing.contains(name) {
                continue;
            }
            writer
                .start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            writer.write_all(bytes)?;
        }

        writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;
        Ok(())
    }
}

/// Generate the deck: one slide per team, written as a complete PPTX.
///
/// The template slide is cloned until the package has one slide per
/// team, then team `i` substitutes into slide `i` (the roster is
/// already in presentation order).
pub fn generate_deck<R: Read + Seek, W: Write + Seek>(
    package: &mut TemplatePackage<R>,
    roster: &Roster,
    mapping: &FieldMapping,
    out: W,
) -> Result<DeckSummary> {
    if roster.is_empty() {
        return Err(Error::EmptyRoster);
    }
    if package.slide_count() == 0 {
        return Err(Error::PptxParseError("template has no slides".to_string()));
    }

    while package.slide_count() < roster.len() {
        package.clone_template_slide()?;
    }

    let mut unresolved: Vec<String> = Vec::new();

    for (idx, team) in roster.teams.iter().enumerate() {
        let slide_path = package.slide_paths()[idx].clone();
        let slide_xml = package.part_text(&slide_path)?;
        let values = team.placeholder_map(mapping);
        let substituted = substitute_slide(&slide_xml, &values)?;

        for token in unresolved_tokens(&substituted) {
            if !unresolved.contains(&token) {
                log::warn!(
                    "Placeholder {} on slide {} has no roster value",
                    token,
                    idx + 1
                );
                unresolved.push(token);
            }
        }

        log::debug!("Rendered team '{}' into '{}'", team.name, slide_path);
        package.set_part(slide_path, substituted.into_bytes());
    }

    let slides = package.slide_count();
    package.write_to(out)?;

    Ok(DeckSummary {
        teams: roster.len(),
        slides,
        unresolved,
    })
}
