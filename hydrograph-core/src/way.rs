//! Path entities and their derived fields.

use std::{borrow::Cow, fmt};

use crate::{EntityError, OsmId, parse_osm_id};

/// Semantic type derived for a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WayType {
    /// The way carries `bridge=yes`.
    Bridge,
}

impl WayType {
    /// Staged column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bridge => "bridge",
        }
    }
}

/// An ordered path over node references, accumulated while the element is open.
///
/// # Examples
/// ```
/// use hydrograph_core::{Way, WayType};
///
/// let mut way = Way::new(10);
/// way.push_node(1);
/// way.push_node(2);
/// way.apply_tag("bridge", "yes");
///
/// assert_eq!(way.resolved_name(), "#10");
/// assert_eq!(way.resolved_type(), Some(WayType::Bridge));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Way {
    /// Way identifier.
    pub id: OsmId,
    /// Referenced node ids in document order.
    pub nodes: Vec<OsmId>,
    /// Raw `bridge` tag.
    pub bridge: Option<String>,
    /// Raw `ref` tag.
    pub reference: Option<String>,
    /// Raw `name` tag.
    pub name: Option<String>,
    /// Raw `name:fr` tag.
    pub name_fr: Option<String>,
}

impl Way {
    /// Start a way with no references or tags.
    #[must_use]
    pub fn new(id: OsmId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Start a way from its raw `id` attribute.
    pub fn from_attributes(id: Option<&str>) -> Result<Self, EntityError> {
        parse_osm_id(id).map(Self::new)
    }

    /// Append a node reference.
    pub fn push_node(&mut self, node: OsmId) {
        self.nodes.push(node);
    }

    /// Record a tag if the key is one a way tracks.
    ///
    /// Returns `false` for keys that are ignored.
    pub fn apply_tag(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "name" => &mut self.name,
            "name:fr" => &mut self.name_fr,
            "ref" => &mut self.reference,
            "bridge" => &mut self.bridge,
            _ => return false,
        };
        *slot = Some(value.to_owned());
        true
    }

    /// Display name: `name:fr`, then `name`, then `ref`, then `#<id>`.
    ///
    /// Empty tag values are skipped.
    #[must_use]
    pub fn resolved_name(&self) -> Cow<'_, str> {
        [&self.name_fr, &self.name, &self.reference]
            .into_iter()
            .find_map(|candidate| candidate.as_deref().filter(|value| !value.is_empty()))
            .map_or_else(|| Cow::Owned(format!("#{}", self.id)), Cow::Borrowed)
    }

    /// `Bridge` when the way is tagged `bridge=yes`.
    #[must_use]
    pub fn resolved_type(&self) -> Option<WayType> {
        (self.bridge.as_deref() == Some("yes")).then_some(WayType::Bridge)
    }
}

impl fmt::Display for Way {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Way #{}, {}", self.id, self.resolved_name())
    }
}
