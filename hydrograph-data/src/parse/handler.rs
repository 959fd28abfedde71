//! Element open/close state machine.
//!
//! At most one node, way and relation is open at a time. Child elements
//! (`nd`, `member`, `tag`) mutate whichever entity is open; closing a
//! top-level element hands the finished entity to an [`EntitySink`] and
//! clears its slot.

use log::debug;
use serde::Serialize;

use hydrograph_core::{MemberRole, Node, Relation, Way, parse_reference};

use super::ElementAttributes;

/// Receives entities as their closing markup is seen.
pub trait EntitySink {
    /// Error raised when an entity cannot be accepted.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Accept a finished node.
    fn accept_node(&mut self, node: &Node) -> Result<(), Self::Error>;

    /// Accept a finished way.
    fn accept_way(&mut self, way: &Way) -> Result<(), Self::Error>;

    /// Accept a finished relation, whatever its derived type.
    fn accept_relation(&mut self, relation: &Relation) -> Result<(), Self::Error>;
}

/// Counts of entities handed on or skipped during a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Nodes handed to the sink.
    pub nodes: u64,
    /// Ways handed to the sink.
    pub ways: u64,
    /// Relations handed to the sink.
    pub relations: u64,
    /// Nodes dropped for a bad id or coordinate.
    pub skipped_nodes: u64,
    /// Ways dropped for a bad id.
    pub skipped_ways: u64,
    /// Relations dropped for a bad id.
    pub skipped_relations: u64,
    /// `nd` or `member` references dropped for a bad `ref`.
    pub skipped_references: u64,
}

/// The structural parser's state: the currently open entity of each kind.
#[derive(Debug, Default)]
pub struct OsmHandler {
    node: Option<Node>,
    way: Option<Way>,
    relation: Option<Relation>,
    stats: ParseStats,
}

impl OsmHandler {
    /// Create a handler with nothing open.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an element-open event.
    pub fn open_element(&mut self, name: &str, attributes: &ElementAttributes) {
        match name {
            "node" => self.open_node(attributes),
            "way" => self.open_way(attributes),
            "relation" => self.open_relation(attributes),
            "nd" => self.add_node_reference(attributes),
            "member" => self.add_member(attributes),
            "tag" => self.apply_tag(attributes),
            _ => {}
        }
    }

    /// Apply an element-close event, handing any finished entity to `sink`.
    pub fn close_element<S: EntitySink>(&mut self, name: &str, sink: &mut S) -> Result<(), S::Error> {
        match name {
            "node" => {
                if let Some(node) = self.node.take() {
                    debug!("adding {node}");
                    sink.accept_node(&node)?;
                    self.stats.nodes += 1;
                }
            }
            "way" => {
                if let Some(way) = self.way.take() {
                    debug!("adding {way}");
                    sink.accept_way(&way)?;
                    self.stats.ways += 1;
                }
            }
            "relation" => {
                if let Some(relation) = self.relation.take() {
                    debug!("closing {relation}");
                    sink.accept_relation(&relation)?;
                    self.stats.relations += 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Consume the handler, returning its counters.
    #[must_use]
    pub fn into_stats(self) -> ParseStats {
        self.stats
    }

    fn open_node(&mut self, attributes: &ElementAttributes) {
        self.node = match Node::from_attributes(
            attributes.get("id"),
            attributes.get("lon"),
            attributes.get("lat"),
        ) {
            Ok(node) => Some(node),
            Err(err) => {
                debug!("Skipped node {:?}: {err}", attributes.get("id"));
                self.stats.skipped_nodes += 1;
                None
            }
        };
    }

    fn open_way(&mut self, attributes: &ElementAttributes) {
        self.way = match Way::from_attributes(attributes.get("id")) {
            Ok(way) => Some(way),
            Err(err) => {
                debug!("Skipped way: {err}");
                self.stats.skipped_ways += 1;
                None
            }
        };
    }

    fn open_relation(&mut self, attributes: &ElementAttributes) {
        self.relation = match Relation::from_attributes(attributes.get("id")) {
            Ok(relation) => Some(relation),
            Err(err) => {
                debug!("Skipped relation: {err}");
                self.stats.skipped_relations += 1;
                None
            }
        };
    }

    fn add_node_reference(&mut self, attributes: &ElementAttributes) {
        let reference = match parse_reference(attributes.get("ref")) {
            Ok(reference) => reference,
            Err(err) => {
                debug!("Skipped nd reference: {err}");
                self.stats.skipped_references += 1;
                return;
            }
        };
        if let Some(way) = self.way.as_mut() {
            way.push_node(reference);
        }
    }

    fn add_member(&mut self, attributes: &ElementAttributes) {
        let reference = match parse_reference(attributes.get("ref")) {
            Ok(reference) => reference,
            Err(err) => {
                debug!("Skipped member reference: {err}");
                self.stats.skipped_references += 1;
                return;
            }
        };
        if let Some(relation) = self.relation.as_mut()
            && let Some(role) = MemberRole::classify(attributes.get("type"), attributes.get("role"))
        {
            relation.push_member(role, reference);
        }
    }

    // The relation wins if both slots are somehow occupied.
    fn apply_tag(&mut self, attributes: &ElementAttributes) {
        let (Some(key), Some(value)) = (attributes.get("k"), attributes.get("v")) else {
            return;
        };
        if let Some(relation) = self.relation.as_mut() {
            relation.apply_tag(key, value);
        } else if let Some(way) = self.way.as_mut() {
            way.apply_tag(key, value);
        }
    }
}
