use crate::error::ExportError;
use crate::models::ArtistSource;
use crate::normalize::{ExportRecord, EXPORT_FIELDS};
use crate::util::normalize_artist_id;
use anyhow::anyhow;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Text encoding of the written file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    /// UTF-16 little endian with BOM, what spreadsheet imports of older exports expect.
    #[default]
    Utf16,
    Utf8,
}

impl FromStr for OutputEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "utf16" => Ok(OutputEncoding::Utf16),
            "utf8" => Ok(OutputEncoding::Utf8),
            other => Err(anyhow!("unknown encoding '{}', expected utf16 or utf8", other)),
        }
    }
}

/// `YYYYmmddHHMMSS` in local time; keeps repeated exports from overwriting each other.
pub fn nonce_now() -> String {
    chrono::Local::now().format("%Y%m%d%H%M%S").to_string()
}

/// Export path next to the input list (`<dir>/<stem>_<nonce>.csv`, stem cut at
/// the first dot), or `./<id1>_<id2>_<nonce>.csv` for ids given directly.
pub fn output_path(source: &ArtistSource, nonce: &str) -> PathBuf {
    match source {
        ArtistSource::File(p) => {
            let file_name = p.file_name().and_then(|s| s.to_str()).unwrap_or("artists");
            let stem = file_name.split('.').next().unwrap_or(file_name);
            let dir = p.parent().map(Path::to_path_buf).unwrap_or_default();
            dir.join(format!("{}_{}.csv", stem, nonce))
        }
        ArtistSource::Literal(ids) => {
            // URIs and URLs are reduced to bare ids so the name stays one path component
            let ids: Vec<String> = ids.iter().map(|s| normalize_artist_id(s)).collect();
            PathBuf::from(".").join(format!("{}_{}.csv", ids.join("_"), nonce))
        }
    }
}

/// Write the header (`EXPORT_FIELDS`) and one row per record.
pub fn write_records<W: Write>(out: W, records: &[ExportRecord], encoding: OutputEncoding) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::EmptyExport);
    }
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    wtr.write_record(EXPORT_FIELDS)?;
    for r in records {
        wtr.serialize(r)?;
    }
    let buf = wtr
        .into_inner()
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    encode_into(out, buf, encoding)
}

fn encode_into<W: Write>(mut out: W, utf8: Vec<u8>, encoding: OutputEncoding) -> Result<(), ExportError> {
    match encoding {
        OutputEncoding::Utf8 => out.write_all(&utf8)?,
        OutputEncoding::Utf16 => {
            let text = String::from_utf8(utf8)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            let mut bytes = Vec::with_capacity(2 + text.len() * 2);
            bytes.extend_from_slice(&[0xFF, 0xFE]);
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            out.write_all(&bytes)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Create `path` and write the export into it. Nothing is created for an
/// empty record set.
pub fn write_export(path: &Path, records: &[ExportRecord], encoding: OutputEncoding) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::EmptyExport);
    }
    let f = std::fs::File::create(path)?;
    write_records(std::io::BufWriter::new(f), records, encoding)
}
