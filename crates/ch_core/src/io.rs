//! On-disk wire formats (spec §6): `.hsgr`, `.nodes`, `.edges`, `.names`,
//! and the turn-restrictions file, plus the query-side `PhantomNode`.
//!
//! Every layout here is specified byte-for-byte (fixed-width little-endian
//! records, explicit prefix sums), so it is hand-written with
//! `to_le_bytes`/`from_le_bytes` rather than routed through `bincode` —
//! the same choice `geometry.rs` makes for its own payload, and the reason
//! `SPEC_FULL.md` §10 gives for keeping `bincode` only for convenience
//! whole-structure dumps like `FlushSlot::write_value`. The `.hsgr`
//! checksum uses `crc32fast`, matching `butterfly-osm`'s `butterfly-io`
//! crate's use of the same crate for its own container checksums.

use crc32fast::Hasher;

use crate::constants::{NodeId, Weight};
use crate::edge_expansion::EdgeBasedNode;
use crate::error::{CoreError, Result};
use crate::graph::static_graph::{StaticEdgeData, StaticGraph};

fn truncated() -> CoreError {
    CoreError::invalid_input("truncated or corrupt wire-format file")
}

fn read_u32(bytes: &[u8], off: &mut usize) -> Result<u32> {
    let v = bytes
        .get(*off..*off + 4)
        .ok_or_else(truncated)?
        .try_into()
        .unwrap();
    *off += 4;
    Ok(u32::from_le_bytes(v))
}

fn read_i32(bytes: &[u8], off: &mut usize) -> Result<i32> {
    let v = bytes
        .get(*off..*off + 4)
        .ok_or_else(truncated)?
        .try_into()
        .unwrap();
    *off += 4;
    Ok(i32::from_le_bytes(v))
}

fn read_u8(bytes: &[u8], off: &mut usize) -> Result<u8> {
    let v = *bytes.get(*off).ok_or_else(truncated)?;
    *off += 1;
    Ok(v)
}

/// Edge flag bits packed into `.hsgr`'s `EdgeData::flags` byte.
mod flags {
    pub const SHORTCUT: u8 = 1 << 0;
    pub const FORWARD: u8 = 1 << 1;
    pub const BACKWARD: u8 = 1 << 2;
    pub const VIA_IS_ORIGINAL: u8 = 1 << 3;
}

/// CRC32 over an [`EdgeBasedNode`] list, used as the `.hsgr` checksum so a
/// stale hierarchy built against a different edge-based graph is detected
/// before it is paired with a (out-of-scope) nearest-neighbor grid.
pub fn edge_based_node_checksum(nodes: &[EdgeBasedNode]) -> u32 {
    let mut hasher = Hasher::new();
    for n in nodes {
        hasher.update(&n.source.to_le_bytes());
        hasher.update(&n.target.to_le_bytes());
        hasher.update(&n.weight.to_le_bytes());
    }
    hasher.finalize()
}

/// Serialize a contracted [`StaticGraph`] as a `.hsgr` file (spec §6).
pub fn write_hsgr(graph: &StaticGraph, checksum: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(&(graph.num_nodes() as u32).to_le_bytes());

    for &first_edge in graph.first_edge_table() {
        out.extend_from_slice(&first_edge.to_le_bytes());
    }

    out.extend_from_slice(&(graph.num_edges() as u32).to_le_bytes());
    for node in 0..graph.num_nodes() as NodeId {
        for (_, target, data) in graph.out_edges(node) {
            out.extend_from_slice(&target.to_le_bytes());
            out.extend_from_slice(&data.weight.to_le_bytes());
            out.extend_from_slice(&data.middle.unwrap_or(0).to_le_bytes());
            let mut flag_byte = 0u8;
            if data.is_shortcut() {
                flag_byte |= flags::SHORTCUT;
            }
            if data.forward {
                flag_byte |= flags::FORWARD;
            }
            if data.backward {
                flag_byte |= flags::BACKWARD;
            }
            out.push(flag_byte);
        }
    }
    out
}

/// Parse a `.hsgr` file back into a [`StaticGraph`] plus its stored
/// checksum, for a query process loading a preprocessed hierarchy.
pub fn read_hsgr(bytes: &[u8]) -> Result<(StaticGraph, u32)> {
    let mut off = 0usize;
    let checksum = read_u32(bytes, &mut off)?;
    let num_nodes = read_u32(bytes, &mut off)? as usize;

    let mut first_edge = Vec::with_capacity(num_nodes + 1);
    for _ in 0..=num_nodes {
        first_edge.push(read_u32(bytes, &mut off)?);
    }

    let num_edges = read_u32(bytes, &mut off)? as usize;
    let mut edges = Vec::with_capacity(num_edges);
    for node in 0..num_nodes {
        let start = first_edge[node] as usize;
        let end = first_edge[node + 1] as usize;
        for _ in start..end {
            let target = read_u32(bytes, &mut off)?;
            let weight: Weight = read_u32(bytes, &mut off)?;
            let middle_raw = read_u32(bytes, &mut off)?;
            let flag_byte = read_u8(bytes, &mut off)?;
            let is_shortcut = flag_byte & flags::SHORTCUT != 0;
            let data = StaticEdgeData {
                weight,
                middle: if is_shortcut { Some(middle_raw) } else { None },
                forward: flag_byte & flags::FORWARD != 0,
                backward: flag_byte & flags::BACKWARD != 0,
            };
            edges.push((node as NodeId, target, data));
        }
    }
    let _ = flags::VIA_IS_ORIGINAL; // only meaningful to the (external) renumbering pass.
    Ok((StaticGraph::build(num_nodes, edges), checksum))
}

/// One row of the `.nodes` file: internal id is the row index, `external_id`
/// is the id the (out-of-scope) OSM loader originally assigned. Coordinates
/// are integer micro-degrees (`lat`/`lon` * 10^6), per spec §6, so the
/// nearest-neighbor grid can compare them exactly rather than with
/// floating-point tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub lat_e6: i32,
    pub lon_e6: i32,
    pub external_id: u32,
}

pub fn write_nodes(nodes: &[NodeInfo]) -> Vec<u8> {
    let mut out = Vec::with_capacity(nodes.len() * 12);
    for n in nodes {
        out.extend_from_slice(&n.lat_e6.to_le_bytes());
        out.extend_from_slice(&n.lon_e6.to_le_bytes());
        out.extend_from_slice(&n.external_id.to_le_bytes());
    }
    out
}

pub fn read_nodes(bytes: &[u8]) -> Result<Vec<NodeInfo>> {
    if bytes.len() % 12 != 0 {
        return Err(truncated());
    }
    let mut off = 0usize;
    let mut out = Vec::with_capacity(bytes.len() / 12);
    while off < bytes.len() {
        let lat_e6 = read_i32(bytes, &mut off)?;
        let lon_e6 = read_i32(bytes, &mut off)?;
        let external_id = read_u32(bytes, &mut off)?;
        out.push(NodeInfo {
            lat_e6,
            lon_e6,
            external_id,
        });
    }
    Ok(out)
}

/// One row of the `.names` file (spec §6): `count` followed by `count`
/// length-prefixed UTF-8 strings.
pub fn write_names(names: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(names.len() as u32).to_le_bytes());
    for name in names {
        let bytes = name.as_bytes();
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }
    out
}

pub fn read_names(bytes: &[u8]) -> Result<Vec<String>> {
    let mut off = 0usize;
    let count = read_u32(bytes, &mut off)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_u32(bytes, &mut off)? as usize;
        let slice = bytes.get(off..off + len).ok_or_else(truncated)?;
        off += len;
        out.push(
            String::from_utf8(slice.to_vec())
                .map_err(|_| CoreError::invalid_input("non-UTF-8 name entry"))?,
        );
    }
    Ok(out)
}

/// One row of the restrictions file (spec §6): `{u32 from; u32 via; u32 to;
/// u8 is_only}`, `count`-prefixed.
pub fn write_restrictions(restrictions: &[crate::graph::Restriction]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(restrictions.len() as u32).to_le_bytes());
    for r in restrictions {
        out.extend_from_slice(&r.from.to_le_bytes());
        out.extend_from_slice(&r.via.to_le_bytes());
        out.extend_from_slice(&r.to.to_le_bytes());
        out.push(r.only as u8);
    }
    out
}

pub fn read_restrictions(bytes: &[u8]) -> Result<Vec<crate::graph::Restriction>> {
    let mut off = 0usize;
    let count = read_u32(bytes, &mut off)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let from = read_u32(bytes, &mut off)?;
        let via = read_u32(bytes, &mut off)?;
        let to = read_u32(bytes, &mut off)?;
        let only = read_u8(bytes, &mut off)? != 0;
        out.push(crate::graph::Restriction { from, via, to, only });
    }
    Ok(out)
}

/// One row of the `.edges` auxiliary file (spec §6): rendering-only
/// metadata keyed by edge-based node id, never read back by the core query
/// path (`CHSearch`/`many_to_many` only ever touch `.hsgr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDescriptor {
    pub name_id: u32,
    pub turn_instruction: u8,
    pub geometry_chunk_id: u32,
}

pub fn write_edge_descriptors(rows: &[EdgeDescriptor]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows.len() * 9);
    for r in rows {
        out.extend_from_slice(&r.name_id.to_le_bytes());
        out.push(r.turn_instruction);
        out.extend_from_slice(&r.geometry_chunk_id.to_le_bytes());
    }
    out
}

pub fn read_edge_descriptors(bytes: &[u8]) -> Result<Vec<EdgeDescriptor>> {
    if bytes.len() % 9 != 0 {
        return Err(truncated());
    }
    let mut off = 0usize;
    let mut out = Vec::with_capacity(bytes.len() / 9);
    while off < bytes.len() {
        let name_id = read_u32(bytes, &mut off)?;
        let turn_instruction = read_u8(bytes, &mut off)?;
        let geometry_chunk_id = read_u32(bytes, &mut off)?;
        out.push(EdgeDescriptor {
            name_id,
            turn_instruction,
            geometry_chunk_id,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Restriction;

    #[test]
    fn edge_descriptors_round_trip() {
        let rows = vec![
            EdgeDescriptor {
                name_id: 3,
                turn_instruction: 2,
                geometry_chunk_id: 0,
            },
            EdgeDescriptor {
                name_id: 7,
                turn_instruction: 0,
                geometry_chunk_id: 5,
            },
        ];
        let bytes = write_edge_descriptors(&rows);
        assert_eq!(read_edge_descriptors(&bytes).unwrap(), rows);
    }

    #[test]
    fn hsgr_round_trips_a_small_graph() {
        let edges = vec![
            (
                0,
                1,
                StaticEdgeData {
                    weight: 10,
                    middle: None,
                    forward: true,
                    backward: false,
                },
            ),
            (
                1,
                2,
                StaticEdgeData {
                    weight: 5,
                    middle: Some(0),
                    forward: true,
                    backward: true,
                },
            ),
        ];
        let g = StaticGraph::build(3, edges);
        let bytes = write_hsgr(&g, 0xdead_beef);
        let (g2, checksum) = read_hsgr(&bytes).unwrap();
        assert_eq!(checksum, 0xdead_beef);
        assert_eq!(g2.num_nodes(), g.num_nodes());
        assert_eq!(g2.num_edges(), g.num_edges());
        let e = g2.out_edges(1).next().unwrap();
        assert_eq!(e.1, 2);
        assert_eq!(e.2.weight, 5);
        assert_eq!(e.2.middle, Some(0));
    }

    #[test]
    fn nodes_round_trip() {
        let nodes = vec![
            NodeInfo {
                lat_e6: 52_520_000,
                lon_e6: 13_405_000,
                external_id: 42,
            },
            NodeInfo {
                lat_e6: -33_868_800,
                lon_e6: 151_209_300,
                external_id: 7,
            },
        ];
        let bytes = write_nodes(&nodes);
        assert_eq!(read_nodes(&bytes).unwrap(), nodes);
    }

    #[test]
    fn names_round_trip() {
        let names = vec!["Main St".to_string(), "".to_string(), "Rue de la Paix".to_string()];
        let bytes = write_names(&names);
        assert_eq!(read_names(&bytes).unwrap(), names);
    }

    #[test]
    fn restrictions_round_trip() {
        let restrictions = vec![
            Restriction {
                from: 1,
                via: 2,
                to: 3,
                only: false,
            },
            Restriction {
                from: 5,
                via: 2,
                to: 6,
                only: true,
            },
        ];
        let bytes = write_restrictions(&restrictions);
        assert_eq!(read_restrictions(&bytes).unwrap(), restrictions);
    }

    #[test]
    fn checksum_changes_when_nodes_change() {
        let a = vec![EdgeBasedNode {
            source: 0,
            target: 1,
            weight: 10,
            component: 0,
        }];
        let b = vec![EdgeBasedNode {
            source: 0,
            target: 1,
            weight: 20,
            component: 0,
        }];
        assert_ne!(edge_based_node_checksum(&a), edge_based_node_checksum(&b));
    }
}
