use std::fmt::Write as _;

use crate::errors::SGError;
use crate::storage::{GridPoint, GridStorage};

const TEXT_HEADER: &str = "hsgrid storage v1";

///
/// Serialization format options for grid storage.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SerializationFormat
{
    /// Line-oriented text stream, human readable and version checked
    #[default]
    Text,
    /// JSON over the serde derives
    Json,
    /// JSON with LZ4 compression
    JsonLz4,
}

impl SerializationFormat
{
    pub fn is_compressed(&self) -> bool
    {
        matches!(self, SerializationFormat::JsonLz4)
    }
}

///
/// Serialize a storage to bytes in the given format.
///
pub fn serialize_storage(storage: &GridStorage, format: SerializationFormat)
    -> Result<Vec<u8>, SGError>
{
    match format
    {
        SerializationFormat::Text => Ok(to_text(storage).into_bytes()),
        SerializationFormat::Json =>
        {
            serde_json::to_vec(storage).map_err(|_| SGError::SerializationFailed)
        }
        SerializationFormat::JsonLz4 =>
        {
            let bytes = serde_json::to_vec(storage).map_err(|_| SGError::SerializationFailed)?;
            Ok(lz4_flex::compress_prepend_size(&bytes))
        }
    }
}

///
/// Reconstruct a storage from bytes. The text path rebuilds the key map and
/// inner flags from scratch; point sequence order is preserved exactly.
///
pub fn deserialize_storage(data: &[u8], format: SerializationFormat)
    -> Result<GridStorage, SGError>
{
    match format
    {
        SerializationFormat::Text =>
        {
            let text = std::str::from_utf8(data).map_err(|_| SGError::DeserializationFailed)?;
            from_text(text)
        }
        SerializationFormat::Json =>
        {
            serde_json::from_slice(data).map_err(|_| SGError::DeserializationFailed)
        }
        SerializationFormat::JsonLz4 =>
        {
            let decompressed = lz4_flex::decompress_size_prepended(data)
                .map_err(|_| SGError::LZ4DecompressionFailed)?;
            serde_json::from_slice(&decompressed).map_err(|_| SGError::DeserializationFailed)
        }
    }
}

///
/// Write a storage to a file in the given format.
///
pub fn save_storage<P: AsRef<std::path::Path>>(path: P, storage: &GridStorage,
    format: SerializationFormat) -> Result<(), SGError>
{
    let bytes = serialize_storage(storage, format)?;
    std::fs::write(path, bytes).map_err(|_| SGError::FileIOError)
}

///
/// Read a storage back from a file.
///
pub fn load_storage<P: AsRef<std::path::Path>>(path: P, format: SerializationFormat)
    -> Result<GridStorage, SGError>
{
    let data = std::fs::read(path).map_err(|_| SGError::FileIOError)?;
    deserialize_storage(&data, format)
}

fn to_text(storage: &GridStorage) -> String
{
    let d = storage.num_dims();
    let mut out = String::new();
    let _ = writeln!(out, "{}", TEXT_HEADER);
    let _ = writeln!(out, "dim {}", d);
    let _ = writeln!(out, "boundary {}", storage.has_boundary() as u8);
    let bbox = storage.bounding_box();
    let mut line = String::from("bbox");
    for dim in 0..d
    {
        let _ = write!(line, " {} {}", bbox.lower[dim], bbox.upper[dim]);
    }
    let _ = writeln!(out, "{}", line);
    let _ = writeln!(out, "size {}", storage.len());
    for seq in 0..storage.len()
    {
        let mut line = String::new();
        for dim in 0..d
        {
            let _ = write!(line, "{} {} ", storage.level(seq, dim), storage.index(seq, dim));
        }
        let _ = writeln!(out, "{}{}", line, storage.is_leaf(seq) as u8);
    }
    out
}

fn from_text(text: &str) -> Result<GridStorage, SGError>
{
    let mut lines = text.lines();
    if lines.next() != Some(TEXT_HEADER)
    {
        return Err(SGError::DeserializationFailed);
    }
    let d: usize = parse_field(lines.next(), "dim")?;
    let boundary: u8 = parse_field(lines.next(), "boundary")?;
    let mut storage = GridStorage::new(d);

    let bbox_line = lines.next().ok_or(SGError::DeserializationFailed)?;
    let mut tokens = bbox_line.split_ascii_whitespace();
    if tokens.next() != Some("bbox")
    {
        return Err(SGError::DeserializationFailed);
    }
    for dim in 0..d
    {
        storage.bounding_box_mut().lower[dim] = parse_token(tokens.next())?;
        storage.bounding_box_mut().upper[dim] = parse_token(tokens.next())?;
    }

    let size: usize = parse_field(lines.next(), "size")?;
    for _ in 0..size
    {
        let line = lines.next().ok_or(SGError::DeserializationFailed)?;
        let mut tokens = line.split_ascii_whitespace();
        let mut level = vec![0u8; d];
        let mut index = vec![0u32; d];
        for dim in 0..d
        {
            level[dim] = parse_token(tokens.next())?;
            index[dim] = parse_token(tokens.next())?;
        }
        let is_leaf = parse_token::<u8>(tokens.next())? != 0;
        storage.insert(GridPoint::new(&level, &index, is_leaf));
    }
    storage.has_boundary = boundary != 0;
    Ok(storage)
}

fn parse_field<T: std::str::FromStr>(line: Option<&str>, name: &str) -> Result<T, SGError>
{
    let line = line.ok_or(SGError::DeserializationFailed)?;
    let value = line.strip_prefix(name).ok_or(SGError::DeserializationFailed)?;
    value.trim().parse().map_err(|_| SGError::DeserializationFailed)
}

fn parse_token<T: std::str::FromStr>(token: Option<&str>) -> Result<T, SGError>
{
    token.ok_or(SGError::DeserializationFailed)?
        .parse()
        .map_err(|_| SGError::DeserializationFailed)
}
