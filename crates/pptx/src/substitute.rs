//! Placeholder substitution inside slide XML.
//!
//! Editors routinely split a `{{KEY}}` token across several `a:r` runs
//! (spell-check marks, formatting toggles), so matching run-by-run
//! misses placeholders. Matching works on the concatenated text of the
//! whole shape instead: if any key occurs there, the text body is
//! rebuilt from the substituted text, reusing the shape's first
//! paragraph and run properties.

use std::collections::HashMap;
use std::io::Cursor;

use deck_core::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Substitute placeholder values into a slide part.
///
/// Shapes whose concatenated text contains none of the keys pass
/// through unchanged. Keys are full tokens including braces
/// (`{{TEAM_NAME}}`).
pub fn substitute_slide(xml: &str, values: &HashMap<String, String>) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    // Shapes inside a group (`p:grpSp`) pass through untouched; the
    // group's transform owns their layout and rewriting them is not
    // supported.
    let mut group_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e))
                if group_depth == 0 && local_name(e.name().as_ref()) == b"sp" =>
            {
                let shape = buffer_shape(&mut reader, e)?;
                write_shape(&mut writer, shape, values)?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => {
                match &event {
                    Event::Start(e) if local_name(e.name().as_ref()) == b"grpSp" => {
                        group_depth += 1;
                    }
                    Event::End(e) if local_name(e.name().as_ref()) == b"grpSp" => {
                        group_depth = group_depth.saturating_sub(1);
                    }
                    _ => {}
                }
                writer
                    .write_event(event)
                    .map_err(|e| Error::XmlError(format!("Failed to write event: {}", e)))?;
            }
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
            }
        }
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::XmlError(format!("Substituted slide is not UTF-8: {}", e)))
}

/// Collect all events of one `p:sp` subtree, starting from its already
/// consumed opening tag.
fn buffer_shape(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Vec<Event<'static>>> {
    let mut events: Vec<Event<'static>> =
        vec![Event::Start(start.clone().into_owned())];
    let mut depth = 1usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => {
                return Err(Error::XmlError("Unterminated shape in slide".to_string()));
            }
            Ok(event) => {
                let starts_sp = matches!(&event, Event::Start(e)
                    if local_name(e.name().as_ref()) == b"sp");
                let ends_sp = matches!(&event, Event::End(e)
                    if local_name(e.name().as_ref()) == b"sp");

                events.push(event.into_owned());

                if starts_sp {
                    depth += 1;
                }
                if ends_sp {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(events);
                    }
                }
            }
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing shape: {}", e)));
            }
        }
    }
}

/// Write a shape out, substituting its text body if any key matches.
fn write_shape(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    events: Vec<Event<'static>>,
    values: &HashMap<String, String>,
) -> Result<()> {
    let full_text = shape_text(&events)?;
    let matched = values.keys().any(|key| full_text.contains(key.as_str()));

    let output = if matched {
        let mut replaced = full_text;
        for (key, value) in values {
            replaced = replaced.replace(key.as_str(), value);
        }
        rebuild_shape(events, &replaced)?
    } else {
        events
    };

    for event in output {
        writer
            .write_event(event)
            .map_err(|e| Error::XmlError(format!("Failed to write shape: {}", e)))?;
    }
    Ok(())
}

/// Concatenate the visible text of a shape.
///
/// Paragraph boundaries and `a:br` contribute `\n`; only text inside
/// `a:t` counts.
fn shape_text(events: &[Event<'static>]) -> Result<String> {
    let mut text = String::new();
    let mut in_tx_body = false;
    let mut in_t = false;
    let mut paragraphs = 0usize;

    for event in events {
        match event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"txBody" => in_tx_body = true,
                b"p" if in_tx_body => {
                    if paragraphs > 0 {
                        text.push('\n');
                    }
                    paragraphs += 1;
                }
                b"t" if in_tx_body => in_t = true,
                _ => {}
            },
            Event::Empty(e) => {
                if in_tx_body && local_name(e.name().as_ref()) == b"br" {
                    text.push('\n');
                }
            }
            Event::Text(e) => {
                if in_t {
                    let chunk = e
                        .unescape()
                        .map_err(|err| Error::XmlError(format!("Bad run text: {}", err)))?;
                    text.push_str(&chunk);
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"txBody" => in_tx_body = false,
                b"t" => in_t = false,
                _ => {}
            },
            _ => {}
        }
    }

    Ok(text)
}

/// Rebuild a shape's text body around the substituted text.
///
/// Everything outside the `txBody` is kept verbatim, as are `a:bodyPr`
/// and `a:lstStyle`. Each output line becomes one paragraph with a
/// single run, reusing the first paragraph's `a:pPr` and the first
/// run's `a:rPr` so the template formatting survives.
fn rebuild_shape(events: Vec<Event<'static>>, text: &str) -> Result<Vec<Event<'static>>> {
    let body_start = find_element(&events, 0, b"txBody");
    let (body_start, _) = match body_start {
        Some(range) => range,
        // A matching shape always has a text body; bail out unchanged
        // if the markup says otherwise.
        None => return Ok(events),
    };
    let body_end = events[body_start..]
        .iter()
        .position(|e| matches!(e, Event::End(end) if local_name(end.name().as_ref()) == b"txBody"))
        .map(|offset| body_start + offset)
        .ok_or_else(|| Error::XmlError("Unterminated text body in shape".to_string()))?;

    let body_pr = find_element(&events[..body_end], body_start + 1, b"bodyPr");
    let lst_style = find_element(&events[..body_end], body_start + 1, b"lstStyle");
    let p_pr = find_element(&events[..body_end], body_start + 1, b"pPr");
    let r_pr = find_element(&events[..body_end], body_start + 1, b"rPr");

    let mut output: Vec<Event<'static>> = Vec::new();
    output.extend_from_slice(&events[..=body_start]);
    if let Some((start, end)) = body_pr {
        output.extend_from_slice(&events[start..=end]);
    }
    if let Some((start, end)) = lst_style {
        output.extend_from_slice(&events[start..=end]);
    }

    for line in text.split('\n') {
        output.push(Event::Start(BytesStart::new("a:p")));
        if let Some((start, end)) = p_pr {
            output.extend_from_slice(&events[start..=end]);
        }
        output.push(Event::Start(BytesStart::new("a:r")));
        if let Some((start, end)) = r_pr {
            output.extend_from_slice(&events[start..=end]);
        }
        output.push(Event::Start(BytesStart::new("a:t")));
        output.push(Event::Text(BytesText::new(line).into_owned()));
        output.push(Event::End(BytesEnd::new("a:t")));
        output.push(Event::End(BytesEnd::new("a:r")));
        output.push(Event::End(BytesEnd::new("a:p")));
    }

    output.extend_from_slice(&events[body_end..]);
    Ok(output)
}

/// Find the first element with the given local name at or after
/// `from`, returning the (start, end) event index range of its subtree.
/// Self-closing elements span a single index.
fn find_element(
    events: &[Event<'static>],
    from: usize,
    local: &[u8],
) -> Option<(usize, usize)> {
    for (i, event) in events.iter().enumerate().skip(from) {
        match event {
            Event::Empty(e) if local_name(e.name().as_ref()) == local => {
                return Some((i, i));
            }
            Event::Start(e) if local_name(e.name().as_ref()) == local => {
                let mut depth = 1usize;
                for (j, inner) in events.iter().enumerate().skip(i + 1) {
                    match inner {
                        Event::Start(_) => depth += 1,
                        Event::End(_) => {
                            depth -= 1;
                            if depth == 0 {
                                return Some((i, j));
                            }
                        }
                        _ => {}
                    }
                }
                return None;
            }
            _ => {}
        }
    }
    None
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
