//! Loading [`ImportEdge`]/[`Restriction`]/[`Node`] from the `.osrm` /
//! `.osrm.restrictions` CSV-ish inputs (spec §6), adapting the teacher
//! crate's `csv`-backed `Graph::from_csv` loader to the two-file,
//! edge-plus-restriction shape this spec requires instead of a single
//! weighted-edge-list file.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::graph::{ImportEdge, Node, Restriction};

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: u32,
    target: u32,
    weight: u32,
    #[serde(default = "default_true")]
    forward: bool,
    #[serde(default)]
    backward: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: u32,
    lat: f64,
    lon: f64,
    #[serde(default)]
    barrier: bool,
    #[serde(default)]
    traffic_light: bool,
}

/// A loaded node plus the two boolean tags `spec.md` §4.4 reads out of the
/// node-based input: whether it's an impassable barrier and whether it
/// carries a traffic signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTags {
    pub barrier: bool,
    pub traffic_light: bool,
}

#[derive(Debug, Deserialize)]
struct RestrictionRecord {
    from: u32,
    via: u32,
    to: u32,
    #[serde(default)]
    only: bool,
}

fn validate_edge(edge: &ImportEdge) -> Result<()> {
    if edge.weight == 0 {
        return Err(CoreError::invalid_input(format!(
            "edge {}->{} has non-positive weight",
            edge.source, edge.target
        )));
    }
    if edge.weight > crate::constants::MAX_EDGE_WEIGHT {
        return Err(CoreError::invalid_input(format!(
            "edge {}->{} weight {} exceeds 24h maximum",
            edge.source, edge.target, edge.weight
        )));
    }
    if !edge.forward && !edge.backward {
        return Err(CoreError::invalid_input(format!(
            "edge {}->{} is neither forward nor backward traversable",
            edge.source, edge.target
        )));
    }
    Ok(())
}

pub fn load_nodes(path: impl AsRef<Path>) -> Result<Vec<Node>> {
    Ok(load_nodes_with_tags(path)?.0)
}

/// Like [`load_nodes`], but also returns each node's barrier/traffic-light
/// tags (spec §4.4 inputs), in the same order as the returned nodes.
pub fn load_nodes_with_tags(path: impl AsRef<Path>) -> Result<(Vec<Node>, Vec<NodeTags>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .from_path(path.as_ref())
        .map_err(|e| CoreError::invalid_input(e.to_string()))?;
    let mut nodes = Vec::new();
    let mut tags = Vec::new();
    for rec in reader.deserialize::<NodeRecord>() {
        let rec = rec.map_err(|e| CoreError::invalid_input(e.to_string()))?;
        nodes.push(Node::new(rec.id, rec.lat, rec.lon));
        tags.push(NodeTags {
            barrier: rec.barrier,
            traffic_light: rec.traffic_light,
        });
    }
    Ok((nodes, tags))
}

pub fn load_edges(path: impl AsRef<Path>, node_count: usize) -> Result<Vec<ImportEdge>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .from_path(path.as_ref())
        .map_err(|e| CoreError::invalid_input(e.to_string()))?;
    let mut edges = Vec::new();
    for rec in reader.deserialize::<EdgeRecord>() {
        let rec = rec.map_err(|e| CoreError::invalid_input(e.to_string()))?;
        if rec.source as usize >= node_count {
            return Err(CoreError::dangling_node(rec.source));
        }
        if rec.target as usize >= node_count {
            return Err(CoreError::dangling_node(rec.target));
        }
        let edge = ImportEdge {
            source: rec.source,
            target: rec.target,
            weight: rec.weight,
            forward: rec.forward,
            backward: rec.backward,
        };
        validate_edge(&edge)?;
        edges.push(edge);
    }
    Ok(edges)
}

/// Parse the `.osrm.restrictions` file (spec §6): one restriction per line,
/// `from;via;to;only`.
pub fn load_restrictions(path: impl AsRef<Path>) -> Result<Vec<Restriction>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .from_path(path.as_ref())
        .map_err(|e| CoreError::invalid_input(e.to_string()))?;
    let mut restrictions = Vec::new();
    for rec in reader.deserialize::<RestrictionRecord>() {
        let rec = rec.map_err(|e| CoreError::invalid_input(e.to_string()))?;
        restrictions.push(Restriction {
            from: rec.from,
            via: rec.via,
            to: rec.to,
            only: rec.only,
        });
    }
    Ok(restrictions)
}

/// Read an entire file into a string, wrapping I/O errors as
/// [`CoreError::InvalidInput`] (used for the Lua profile source, whose
/// contents are merely forwarded to the out-of-scope profile VM).
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let mut s = String::new();
    std::fs::File::open(path.as_ref())
        .and_then(|mut f| f.read_to_string(&mut s))
        .map_err(|e| CoreError::invalid_input(e.to_string()))?;
    Ok(s)
}
