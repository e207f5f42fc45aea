//! Save/load of the backing arrays and settings.
//!
//! The on-disk layout under a storage directory is a small file set:
//! `lats` and `lons` (32-bit floats), `refs` (node head pointers),
//! `edges0..edgesN` (the raw edge-area segments) and `settings` (a
//! field-count-prefixed tuple of counters and the bounding box). All
//! values are big-endian. Files are only open during a save or load
//! call; no handles are held in between.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::bounds::BBox;
use crate::error::{GraphError, Result};
use crate::storage::record::EDGE_UNITS;
use crate::storage::{EdgeArea, NodeTable};

const SETTINGS_FIELDS: u32 = 9;

/// The counters and bounds persisted in the `settings` file.
#[derive(Debug)]
pub(crate) struct Settings {
    pub node_count: i32,
    pub created_ms: i64,
    pub next_global_pointer: i32,
    pub current_segment: i32,
    pub segment_size: i32,
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Settings {
    fn write(&self, path: &Path) -> Result<()> {
        let mut buf = Vec::with_capacity(4 + 4 * 4 + 8 + 4 * 8);
        buf.extend_from_slice(&SETTINGS_FIELDS.to_be_bytes());
        buf.extend_from_slice(&self.node_count.to_be_bytes());
        buf.extend_from_slice(&self.created_ms.to_be_bytes());
        buf.extend_from_slice(&self.next_global_pointer.to_be_bytes());
        buf.extend_from_slice(&self.current_segment.to_be_bytes());
        buf.extend_from_slice(&self.segment_size.to_be_bytes());
        buf.extend_from_slice(&self.min_lon.to_be_bytes());
        buf.extend_from_slice(&self.max_lon.to_be_bytes());
        buf.extend_from_slice(&self.min_lat.to_be_bytes());
        buf.extend_from_slice(&self.max_lat.to_be_bytes());
        fs::write(path, buf).map_err(GraphError::at(path))
    }

    fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(GraphError::at(path))?;
        let mut cursor = Cursor::new(&bytes, path);
        let fields = cursor.u32()?;
        if fields < 3 {
            return Err(GraphError::FormatMismatch(format!(
                "settings file has {fields} fields, need at least 3"
            )));
        }
        if fields != SETTINGS_FIELDS {
            return Err(GraphError::FormatMismatch(format!(
                "unsupported settings layout with {fields} fields"
            )));
        }
        Ok(Self {
            node_count: cursor.i32()?,
            created_ms: cursor.i64()?,
            next_global_pointer: cursor.i32()?,
            current_segment: cursor.i32()?,
            segment_size: cursor.i32()?,
            min_lon: cursor.f64()?,
            max_lon: cursor.f64()?,
            min_lat: cursor.f64()?,
            max_lat: cursor.f64()?,
        })
    }
}

/// Fixed-width big-endian reader over a settings buffer.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self {
            bytes,
            pos: 0,
            path,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let end = self.pos + N;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            GraphError::FormatMismatch(format!("settings file truncated: {}", self.path.display()))
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take()?))
    }
}

fn write_floats(path: &Path, values: &[f32]) -> Result<()> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for value in values {
        buf.extend_from_slice(&value.to_be_bytes());
    }
    fs::write(path, buf).map_err(GraphError::at(path))
}

fn read_floats(path: &Path) -> Result<Vec<f32>> {
    let bytes = fs::read(path).map_err(GraphError::at(path))?;
    if bytes.len() % 4 != 0 {
        return Err(GraphError::FormatMismatch(format!(
            "float file length not a multiple of 4: {}",
            path.display()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn write_ints(path: &Path, values: &[i32]) -> Result<()> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for value in values {
        buf.extend_from_slice(&value.to_be_bytes());
    }
    fs::write(path, buf).map_err(GraphError::at(path))
}

fn read_ints(path: &Path) -> Result<Vec<i32>> {
    let bytes = fs::read(path).map_err(GraphError::at(path))?;
    if bytes.len() % 4 != 0 {
        return Err(GraphError::FormatMismatch(format!(
            "int file length not a multiple of 4: {}",
            path.display()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Writes the complete file set. Node arrays are trimmed to the node count
/// so their on-disk length matches the count check on load. State on disk
/// is undefined after a partial failure.
pub(crate) fn save_graph(
    dir: &Path,
    nodes: &NodeTable,
    edges: &EdgeArea,
    settings: &Settings,
) -> Result<()> {
    fs::create_dir_all(dir).map_err(GraphError::at(dir))?;

    let count = nodes.count();
    write_floats(&dir.join("lats"), &nodes.lats()[..count])?;
    write_floats(&dir.join("lons"), &nodes.lons()[..count])?;
    write_ints(&dir.join("refs"), &nodes.heads()[..count])?;
    for (index, segment) in edges.segments().iter().enumerate() {
        write_ints(&dir.join(format!("edges{index}")), segment)?;
    }
    settings.write(&dir.join("settings"))
}

/// A graph reassembled from disk.
pub(crate) struct LoadedGraph {
    pub nodes: NodeTable,
    pub edges: EdgeArea,
    pub next_global_pointer: i32,
    pub bounds: BBox,
    pub created_ms: i64,
}

/// Reads the file set under `dir`, or returns `None` when the directory
/// does not exist.
pub(crate) fn load_graph(dir: &Path) -> Result<Option<LoadedGraph>> {
    if !dir.exists() {
        return Ok(None);
    }

    let settings = Settings::read(&dir.join("settings"))?;
    if settings.node_count < 0
        || settings.next_global_pointer < 0
        || settings.current_segment < 0
        || settings.segment_size <= 0
    {
        return Err(GraphError::FormatMismatch(
            "negative counter in settings".into(),
        ));
    }

    let lats = read_floats(&dir.join("lats"))?;
    let lons = read_floats(&dir.join("lons"))?;
    let heads = read_ints(&dir.join("refs"))?;
    let node_count = settings.node_count as usize;
    if lats.len() != node_count {
        return Err(GraphError::FormatMismatch(format!(
            "node count {} does not match latitude array length {}",
            node_count,
            lats.len()
        )));
    }
    if lons.len() != lats.len() || heads.len() != lats.len() {
        return Err(GraphError::FormatMismatch(
            "node array lengths disagree".into(),
        ));
    }

    let segment_size = settings.segment_size as usize;
    let mut segments = Vec::with_capacity(settings.current_segment as usize + 1);
    for index in 0..=settings.current_segment {
        let segment = read_ints(&dir.join(format!("edges{index}")))?;
        if segment.len() != segment_size {
            return Err(GraphError::FormatMismatch(format!(
                "segment {index} has length {}, expected {segment_size}",
                segment.len()
            )));
        }
        segments.push(segment.into_boxed_slice());
    }

    info!(
        location = %dir.display(),
        nodes = node_count,
        edges = settings.next_global_pointer / EDGE_UNITS,
        segments = segments.len(),
        segment_size = segment_size,
        created_ms = settings.created_ms,
        "graph.loaded"
    );

    Ok(Some(LoadedGraph {
        nodes: NodeTable::from_parts(lats, lons, heads, node_count),
        edges: EdgeArea::from_parts(segments, segment_size),
        next_global_pointer: settings.next_global_pointer,
        bounds: BBox::new(
            settings.min_lon,
            settings.max_lon,
            settings.min_lat,
            settings.max_lat,
        ),
        created_ms: settings.created_ms,
    }))
}
