//! Co-occurrence graph builder
//!
//! One graph per uploaded document: nodes are the document's extracted
//! concepts, and the weight between two concepts counts the paragraphs that
//! mention both. Detection is case-insensitive substring containment, so a
//! concept whose name sits inside another's ("Loop" in "Loops") fires
//! whenever the longer one does.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t\r]*\n").unwrap();
}

/// concept -> co-occurring concept -> paragraph count. Symmetric, no self
/// loops, no zero weights.
pub type CooccurrenceGraph = BTreeMap<String, BTreeMap<String, u32>>;

/// Split on blank lines, trimming and dropping empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn bump(graph: &mut CooccurrenceGraph, from: &str, to: &str) {
    *graph
        .entry(from.to_string())
        .or_default()
        .entry(to.to_string())
        .or_insert(0) += 1;
}

/// Build the paragraph-level co-occurrence graph of `concepts` over `text`.
pub fn build_cooccurrence(text: &str, concepts: &[String]) -> CooccurrenceGraph {
    let mut graph = CooccurrenceGraph::new();

    let mut seen = HashSet::new();
    let needles: Vec<(&str, String)> = concepts
        .iter()
        .map(String::as_str)
        .filter(|name| !name.trim().is_empty() && seen.insert(*name))
        .map(|name| (name, name.to_lowercase()))
        .collect();

    if needles.len() < 2 {
        return graph;
    }

    for paragraph in split_paragraphs(text) {
        let haystack = paragraph.to_lowercase();
        let present: Vec<&str> = needles
            .iter()
            .filter(|(_, lower)| haystack.contains(lower.as_str()))
            .map(|(name, _)| *name)
            .collect();

        for i in 0..present.len() {
            for j in (i + 1)..present.len() {
                bump(&mut graph, present[i], present[j]);
                bump(&mut graph, present[j], present[i]);
            }
        }
    }

    graph
}

/// Filename-keyed store of computed graphs. Re-uploading a filename
/// replaces its graph; graphs from different files are never merged.
#[derive(Default)]
pub struct GraphStore {
    graphs: DashMap<String, Arc<CooccurrenceGraph>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, filename: &str, graph: CooccurrenceGraph) -> Arc<CooccurrenceGraph> {
        let graph = Arc::new(graph);
        debug!("Storing co-occurrence graph for '{}' ({} nodes)", filename, graph.len());
        self.graphs.insert(filename.to_string(), Arc::clone(&graph));
        graph
    }

    pub fn get(&self, filename: &str) -> Option<Arc<CooccurrenceGraph>> {
        self.graphs.get(filename).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}
