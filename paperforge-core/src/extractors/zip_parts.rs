use crate::error::ExtractionError;
use quick_xml::events::BytesText;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, ExtractionError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::ContainerOpenFailed {
        reason: e.to_string(),
    })
}

pub(crate) fn entry_names(archive: &Archive<'_>) -> Vec<String> {
    archive.file_names().map(str::to_string).collect()
}

/// Entries named `{prefix}N{suffix}`, sorted by N numerically.
///
/// A name whose N is not a number sorts as 0, ahead of every real part.
pub(crate) fn numbered_parts(names: &[String], prefix: &str, suffix: &str) -> Vec<(usize, String)> {
    let mut parts: Vec<(usize, String)> = names
        .iter()
        .filter_map(|name| {
            let index = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
            Some((index.parse::<usize>().unwrap_or(0), name.clone()))
        })
        .collect();
    parts.sort_by_key(|(index, _)| *index);
    parts
}

/// Read a part as text, replacing invalid UTF-8
pub(crate) fn read_part(archive: &mut Archive<'_>, name: &str) -> std::io::Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    let mut buffer = Vec::new();
    entry.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// HTML entities that exporters leave in OOXML text runs
fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "hellip" => Some("\u{2026}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "trade" => Some("\u{2122}"),
        _ => None,
    }
}

/// Decoded content of one text event.
///
/// A run the unescaper rejects (unknown entity, bad character reference) is
/// kept as raw text instead of failing the whole part.
pub(crate) fn run_text(text: &BytesText<'_>) -> String {
    match text.unescape_with(html_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Keeping raw text run: {e}");
            String::from_utf8_lossy(text).into_owned()
        }
    }
}
