use std::fmt;

/// A staged target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StagingTable {
    /// River and boundary relations.
    Relations,
    /// Parent/tributary relation pairs.
    Tributaries,
    /// Relation/member way pairs.
    WaysInRel,
    /// Ways with their derived name and type.
    Ways,
    /// Way/node pairs in path order.
    NodesInWay,
    /// Node points.
    Nodes,
    /// Side channel of relation ids to remove from `relations`. Never loaded.
    DiscardedRels,
}

impl StagingTable {
    /// Every staged file, in the order sinks are opened.
    pub const ALL: [Self; 7] = [
        Self::Relations,
        Self::Tributaries,
        Self::WaysInRel,
        Self::Ways,
        Self::NodesInWay,
        Self::Nodes,
        Self::DiscardedRels,
    ];

    /// Bulk load order: entity tables before the join tables that point at them.
    pub const LOAD_ORDER: [Self; 6] = [
        Self::Relations,
        Self::Tributaries,
        Self::WaysInRel,
        Self::Ways,
        Self::NodesInWay,
        Self::Nodes,
    ];

    /// Table name in the store.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Relations => "relations",
            Self::Tributaries => "tributaries",
            Self::WaysInRel => "waysinrel",
            Self::Ways => "ways",
            Self::NodesInWay => "nodesinway",
            Self::Nodes => "nodes",
            Self::DiscardedRels => "discarded_rels",
        }
    }

    /// Column list of the staged rows, in field order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Relations => &["osm_id", "name", "type", "sandre_ref"],
            Self::Tributaries => &["main_id", "tributary_id"],
            Self::WaysInRel => &["rel_id", "way_id"],
            Self::Ways => &["osm_id", "name", "type"],
            Self::NodesInWay => &["way_id", "node_id"],
            Self::Nodes => &["osm_id", "geometry"],
            Self::DiscardedRels => &["rel_id"],
        }
    }

    /// Staged file name inside the staging directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Relations => "relations_data",
            Self::Tributaries => "tributaries_data",
            Self::WaysInRel => "waysinrel_data",
            Self::Ways => "ways_data",
            Self::NodesInWay => "nodesinway_data",
            Self::Nodes => "nodes_data",
            Self::DiscardedRels => "discarded_rels_data",
        }
    }
}

impl fmt::Display for StagingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
