//! DOCX table reader implementation.

use deck_core::{Error, RawTable, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Path of the main document part inside a .docx package.
const DOCUMENT_PART: &str = "word/document.xml";

/// Reader for tables in DOCX (Office Open XML) documents.
pub struct DocxTableReader;

impl DocxTableReader {
    /// Create a new DOCX table reader.
    pub fn new() -> Self {
        Self
    }

    /// Read all top-level tables from a DOCX file.
    ///
    /// Tables come back in document order. A document without tables
    /// yields an empty Vec; the caller decides whether that is an
    /// error.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<RawTable>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content = self.read_file_from_archive(&mut archive, DOCUMENT_PART)?;
        let tables = parse_tables(&content)?;

        log::debug!("Extracted {} table(s) from document", tables.len());
        Ok(tables)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive.by_name(path).map_err(|_| {
            Error::CorruptedFile(format!("'{}' not found in archive", path))
        })?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DocxTableReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `w:tbl` structures out of a document.xml body.
///
/// Only top-level tables produce [`RawTable`]s; a table nested inside a
/// cell flattens into that cell's text. Paragraphs within a cell join
/// with `\n`.
pub(crate) fn parse_tables(xml_content: &str) -> Result<Vec<RawTable>> {
    let mut tables = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    // Depth of nested w:tbl elements; 1 = top-level table.
    let mut table_depth = 0usize;
    let mut current_table: Option<RawTable> = None;
    let mut current_row: Vec<String> = Vec::new();
    let mut current_cell = String::new();
    let mut in_cell = false;
    let mut cell_paragraphs = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"tbl" => {
                    table_depth += 1;
                    if table_depth == 1 {
                        current_table = Some(RawTable::new());
                    }
                }
                b"tr" if table_depth == 1 => {
                    current_row = Vec::new();
                }
                b"tc" if table_depth == 1 => {
                    in_cell = true;
                    current_cell.clear();
                    cell_paragraphs = 0;
                }
                b"p" if in_cell => {
                    cell_paragraphs += 1;
                    if cell_paragraphs > 1 {
                        current_cell.push('\n');
                    }
                }
                b"t" if in_cell => {
                    in_text = true;
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"br" | b"cr" if in_cell => current_cell.push('\n'),
                b"tab" if in_cell => current_cell.push('\t'),
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_text {
                    let text = e.unescape().map_err(|err| {
                        Error::DocxParseError(format!("Bad text content: {}", err))
                    })?;
                    current_cell.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"tbl" => {
                    if table_depth == 0 {
                        return Err(Error::DocxParseError(
                            "Unbalanced table markup in document".to_string(),
                        ));
                    }
                    table_depth -= 1;
                    if table_depth == 0 {
                        if let Some(table) = current_table.take() {
                            if !table.is_empty() {
                                tables.push(table);
                            }
                        }
                    }
                }
                b"tr" if table_depth == 1 => {
                    if let Some(ref mut table) = current_table {
                        table.add_row(std::mem::take(&mut current_row));
                    }
                }
                b"tc" if table_depth == 1 => {
                    in_cell = false;
                    current_row.push(current_cell.trim().to_string());
                }
                b"t" => {
                    in_text = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::DocxParseError(format!(
                    "Error parsing document.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(tables)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    fn cell(text: &str) -> String {
        format!("<w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>", text)
    }

    fn table_of(rows: &[&[&str]]) -> String {
        let mut xml = String::from("<w:tbl>");
        for row in rows {
            xml.push_str("<w:tr>");
            for c in *row {
                xml.push_str(&cell(c));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }

    #[test]
    fn test_parse_simple_table() {
        let xml = doc(&table_of(&[&["Team", "School"], &["Alpha", "North"]]));
        let tables = parse_tables(&xml).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["Team", "School"]);
        assert_eq!(tables[0].rows[1], vec!["Alpha", "North"]);
    }

    #[test]
    fn test_parse_multiple_tables() {
        let body = format!(
            "{}<w:p><w:r><w:t>between</w:t></w:r></w:p>{}",
            table_of(&[&["a"]]),
            table_of(&[&["b"]])
        );
        let tables = parse_tables(&doc(&body)).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["a"]);
        assert_eq!(tables[1].rows[0], vec!["b"]);
    }

    #[test]
    fn test_parse_no_tables() {
        let tables = parse_tables(&doc("<w:p><w:r><w:t>hi</w:t></w:r></w:p>")).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_multi_paragraph_cell_joins_with_newline() {
        let body = "<w:tbl><w:tr><w:tc>\
            <w:p><w:r><w:t>Line one</w:t></w:r></w:p>\
            <w:p><w:r><w:t>Line two</w:t></w:r></w:p>\
            </w:tc></w:tr></w:tbl>";
        let tables = parse_tables(&doc(body)).unwrap();
        assert_eq!(tables[0].rows[0][0], "Line one\nLine two");
    }

    #[test]
    fn test_split_runs_concatenate() {
        let body = "<w:tbl><w:tr><w:tc><w:p>\
            <w:r><w:t>Fogue</w:t></w:r><w:r><w:t>te Azul</w:t></w:r>\
            </w:p></w:tc></w:tr></w:tbl>";
        let tables = parse_tables(&doc(body)).unwrap();
        assert_eq!(tables[0].rows[0][0], "Foguete Azul");
    }

    #[test]
    fn test_nested_table_flattens_into_cell() {
        let inner = "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        let body = format!(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>{}</w:tc></w:tr></w:tbl>",
            inner
        );
        let tables = parse_tables(&doc(&body)).unwrap();

        assert_eq!(tables.len(), 1);
        assert!(tables[0].rows[0][0].contains("outer"));
        assert!(tables[0].rows[0][0].contains("inner"));
    }

    #[test]
    fn test_malformed_markup_is_a_parse_error() {
        // Mismatched closing tag inside the body.
        let xml = doc("<w:tbl><w:tr></w:tbl></w:tr>");
        let result = parse_tables(&xml);
        assert!(matches!(result, Err(Error::DocxParseError(_))));
    }

    #[test]
    fn test_escaped_text_unescapes() {
        let xml = doc(&table_of(&[&["Tom &amp; Jerry"]]));
        let tables = parse_tables(&xml).unwrap();
        assert_eq!(tables[0].rows[0][0], "Tom & Jerry");
    }

    #[test]
    fn test_read_from_zip_package() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", FileOptions::default())
            .unwrap();
        zip.write_all(doc(&table_of(&[&["Equipe"], &["Alpha"]])).as_bytes())
            .unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let tables = DocxTableReader::new().read(Cursor::new(bytes)).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[1], vec!["Alpha"]);
    }

    #[test]
    fn test_missing_document_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("unrelated.txt", FileOptions::default())
            .unwrap();
        zip.write_all(b"nope").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let result = DocxTableReader::new().read(Cursor::new(bytes));
        assert!(matches!(result, Err(Error::CorruptedFile(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let result = DocxTableReader::new().read(Cursor::new(b"plain text".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }
}
