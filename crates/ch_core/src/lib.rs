//! Offline contraction-hierarchy routing core: ingest a node-based graph
//! with turn restrictions, expand it into an edge-based graph, contract
//! that into a hierarchy of shortcut edges, and answer point-to-point and
//! many-to-many shortest-path queries over the result.
//!
//! # Basic usage
//! ```
//! use ch_core::contraction::{ContractorEdgeData, NodeContractor, PriorityWeights};
//! use ch_core::graph::DynamicGraph;
//! use ch_core::graph::static_graph::StaticGraph;
//! use ch_core::search::CHSearch;
//!
//! let mut g: DynamicGraph<ContractorEdgeData> = DynamicGraph::with_node_count(3);
//! g.insert_edge(0, 1, ContractorEdgeData::original(10, true, true));
//! g.insert_edge(1, 2, ContractorEdgeData::original(10, true, true));
//!
//! let result = NodeContractor::new(g, PriorityWeights::default()).run().unwrap();
//! let static_graph = StaticGraph::from_dynamic(&result.graph, |d| {
//!     Some(ch_core::graph::static_graph::StaticEdgeData {
//!         weight: d.weight,
//!         middle: d.middle,
//!         forward: d.forward,
//!         backward: d.backward,
//!     })
//! });
//! let search = CHSearch::new(&static_graph, &result.rank);
//! assert_eq!(search.distance(0, 2), Some(20));
//! ```
pub mod cleanup;
pub mod constants;
pub mod contraction;
pub mod edge_expansion;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod heap;
pub mod io;
pub mod search;
pub mod statistics;
pub mod tabulation_hash;
pub mod util;
