//! `build-sprite`: merge icon SVGs into one `<symbol>` sprite.
//!
//! Each icon `img/icons/<stem>.svg` becomes
//! `<symbol id="<stem>" viewBox="...">children</symbol>`. The viewBox is
//! taken from the icon root, or synthesized from its `width`/`height`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::{TaskContext, TaskError, TaskId, TaskOutcome, TaskResult};
use crate::paths::{AssetKind, PathTable, SourceFile};

const SPRITE_NAME: &str = "sprite.svg";
const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// One parsed icon.
#[derive(Debug)]
struct Icon {
    id: String,
    view_box: Option<String>,
    /// `xmlns:*` declarations the children may rely on.
    namespaces: Vec<(String, String)>,
    body: Vec<u8>,
}

pub fn run(ctx: &TaskContext) -> TaskResult {
    let files = ctx.inputs(TaskId::BuildSprite, AssetKind::Icon);
    if files.is_empty() {
        return Ok(TaskOutcome::Succeeded { written: 0 });
    }
    check_stems(&files)?;

    let icons = files
        .par_iter()
        .map(|file| {
            let content = fs::read(&file.path).map_err(|e| TaskError::fs(&file.path, e))?;
            parse_icon(&file.path, &content)
        })
        .collect::<Result<Vec<_>, TaskError>>()?;

    let dest = sprite_path(&ctx.table);
    let sprite = assemble(&dest, &icons)?;
    ctx.write_output(&dest, &sprite)?;

    crate::debug!(
        "sprite";
        "{} symbols: {}",
        icons.len(),
        symbol_ids(&String::from_utf8_lossy(&sprite))
            .map(|ids| ids.join(", "))
            .unwrap_or_default()
    );
    Ok(TaskOutcome::Succeeded { written: 1 })
}

pub(super) fn sprite_path(table: &PathTable) -> PathBuf {
    table.dest_dir(AssetKind::Icon).join(SPRITE_NAME)
}

fn icon_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Reject two icons that would produce the same symbol id.
fn check_stems(files: &[SourceFile]) -> Result<(), TaskError> {
    let mut seen: FxHashMap<String, &str> = FxHashMap::default();
    for file in files {
        let id = icon_id(&file.path);
        if let Some(first) = seen.insert(id.clone(), &file.rel) {
            return Err(TaskError::tooling(
                &file.path,
                format!("duplicate icon id `{id}`, also defined by {first}"),
            ));
        }
    }
    Ok(())
}

fn parse_icon(path: &Path, content: &[u8]) -> Result<Icon, TaskError> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);
    let mut body = Writer::new(Vec::new());

    let mut root = None;
    let mut depth = 0usize;
    loop {
        let event = reader.read_event().map_err(|e| {
            TaskError::tooling(path, format!("{e} at byte {}", reader.error_position()))
        })?;
        let write_err = |e| TaskError::tooling(path, e);

        match event {
            Event::Start(e) if root.is_none() => {
                root = Some(root_attributes(path, &e)?);
                depth = 1;
            }
            Event::Empty(e) if root.is_none() => {
                root = Some(root_attributes(path, &e)?);
                break;
            }
            Event::Start(e) => {
                depth += 1;
                body.write_event(Event::Start(e)).map_err(write_err)?;
            }
            Event::End(e) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                body.write_event(Event::End(e)).map_err(write_err)?;
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(TaskError::tooling(path, "unclosed <svg> element"));
                }
                break;
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            other if root.is_some() => body.write_event(other).map_err(write_err)?,
            _ => {}
        }
    }

    let Some((view_box, namespaces)) = root else {
        return Err(TaskError::tooling(path, "no <svg> root element"));
    };
    Ok(Icon {
        id: icon_id(path),
        view_box,
        namespaces,
        body: body.into_inner(),
    })
}

type RootAttributes = (Option<String>, Vec<(String, String)>);

fn root_attributes(path: &Path, elem: &BytesStart<'_>) -> Result<RootAttributes, TaskError> {
    if elem.local_name().as_ref() != b"svg" {
        return Err(TaskError::tooling(path, "root element is not <svg>"));
    }

    let mut view_box = None;
    let mut width = None;
    let mut height = None;
    let mut namespaces = Vec::new();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| TaskError::tooling(path, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match key.as_str() {
            "viewBox" => view_box = Some(value),
            "width" => width = dimension(&value),
            "height" => height = dimension(&value),
            k if k.starts_with("xmlns:") => namespaces.push((key, value)),
            _ => {}
        }
    }

    let view_box = view_box.or_else(|| Some(format!("0 0 {} {}", width?, height?)));
    Ok((view_box, namespaces))
}

fn dimension(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

fn assemble(dest: &Path, icons: &[Icon]) -> Result<Vec<u8>, TaskError> {
    let err = |e| TaskError::tooling(dest, e);
    let mut writer = Writer::new(Vec::new());

    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    let mut declared: Vec<&str> = Vec::new();
    for (key, value) in icons.iter().flat_map(|i| &i.namespaces) {
        if !declared.contains(&key.as_str()) {
            root.push_attribute((key.as_str(), value.as_str()));
            declared.push(key);
        }
    }
    writer.write_event(Event::Start(root)).map_err(err)?;

    for icon in icons {
        let mut symbol = BytesStart::new("symbol");
        symbol.push_attribute(("id", icon.id.as_str()));
        if let Some(view_box) = &icon.view_box {
            symbol.push_attribute(("viewBox", view_box.as_str()));
        }
        writer.write_event(Event::Start(symbol)).map_err(err)?;
        writer
            .get_mut()
            .write_all(&icon.body)
            .map_err(|e| TaskError::fs(dest, e))?;
        writer
            .write_event(Event::End(BytesEnd::new("symbol")))
            .map_err(err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("svg")))
        .map_err(err)?;
    Ok(writer.into_inner())
}

/// Symbol ids of a sprite document, in document order.
pub fn symbol_ids(sprite: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(sprite);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"symbol" => {
                if let Some(id) = e.try_get_attribute("id")? {
                    ids.push(String::from_utf8_lossy(&id.value).into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}
