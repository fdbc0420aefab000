//! Native binary form of [`FlatIndex`].
//!
//! Layout, all little-endian:
//!
//! | field   | type          |
//! |---------|---------------|
//! | magic   | `b"RVEC"`     |
//! | version | `u16`         |
//! | dim     | `u32`         |
//! | rows    | `u64`         |
//! | values  | `rows * dim` × `f32` |
//! | crc     | `u32`, CRC-32 of every preceding byte |

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use retrieval_core::error::{Error, Result};
use retrieval_core::traits::VectorIndexer;

use crate::flat::FlatIndex;

pub const MAGIC: &[u8; 4] = b"RVEC";
pub const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 4 + 8;
const CRC_LEN: usize = 4;

fn corrupt(msg: impl Into<String>) -> Error { Error::CorruptIndex(msg.into()) }

pub fn write_index(index: &FlatIndex, writer: &mut dyn Write) -> Result<()> {
    let values = index.as_slice();
    let dim = u32::try_from(index.dim().unwrap_or(0)).map_err(|_| corrupt("dimension does not fit in u32"))?;
    let mut buf = Vec::with_capacity(HEADER_LEN + values.len() * 4 + CRC_LEN);
    buf.write_all(MAGIC)?;
    buf.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    buf.write_u32::<LittleEndian>(dim)?;
    buf.write_u64::<LittleEndian>(index.len() as u64)?;
    for &v in values { buf.write_f32::<LittleEndian>(v)?; }
    let crc = crc32fast::hash(&buf);
    buf.write_u32::<LittleEndian>(crc)?;
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

pub fn read_index(reader: &mut dyn Read) -> Result<FlatIndex> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(corrupt(format!("vector file truncated ({} bytes)", bytes.len())));
    }
    let (body, mut trailer) = bytes.split_at(bytes.len() - CRC_LEN);
    let stored_crc = trailer.read_u32::<LittleEndian>()?;
    if crc32fast::hash(body) != stored_crc {
        return Err(corrupt("vector file checksum mismatch"));
    }

    let mut cur = Cursor::new(body);
    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(corrupt("not a vector index file"));
    }
    let version = cur.read_u16::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(corrupt(format!("unsupported vector format version {version}")));
    }
    let dim = cur.read_u32::<LittleEndian>()? as usize;
    let rows = usize::try_from(cur.read_u64::<LittleEndian>()?).map_err(|_| corrupt("row count overflows"))?;

    let values = rows.checked_mul(dim).ok_or_else(|| corrupt("row count overflows"))?;
    let payload = body.len() - HEADER_LEN;
    if values.checked_mul(4) != Some(payload) {
        return Err(corrupt(format!("expected {values} values for {rows}x{dim}, found {payload} payload bytes")));
    }
    let mut data = vec![0f32; values];
    cur.read_f32_into::<LittleEndian>(&mut data)?;

    let dim = if rows == 0 { None } else { Some(dim) };
    Ok(FlatIndex::from_parts(dim, rows, data))
}
