//! Composite entities: rivers and administrative boundaries.

use std::{borrow::Cow, fmt};

use crate::{EntityError, OsmId, parse_osm_id};

/// Semantic type derived for a relation. Only typed relations get a `relations` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RelationType {
    /// `type=waterway` with `waterway=river` or `waterway=stream`.
    River,
    /// `admin_level=8` with `boundary=administrative`.
    Boundary,
}

impl RelationType {
    /// Staged column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::River => "river",
            Self::Boundary => "boundary",
        }
    }
}

/// How a `member` element contributes to its relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// A way member, whatever its role.
    Way,
    /// A relation member with role `tributary`.
    Tributary,
    /// A relation member with role `side_stream`; the referenced relation is
    /// dropped from the final relation set.
    SideStream,
}

impl MemberRole {
    /// Classify a member from its `type` and `role` attributes.
    ///
    /// Returns `None` for members the pipeline does not track (node members,
    /// relation members with any other role).
    ///
    /// # Examples
    /// ```
    /// use hydrograph_core::MemberRole;
    ///
    /// assert_eq!(MemberRole::classify(Some("way"), Some("outer")), Some(MemberRole::Way));
    /// assert_eq!(MemberRole::classify(Some("relation"), Some("side_stream")), Some(MemberRole::SideStream));
    /// assert_eq!(MemberRole::classify(Some("relation"), Some("subarea")), None);
    /// ```
    #[must_use]
    pub fn classify(member_type: Option<&str>, role: Option<&str>) -> Option<Self> {
        match (member_type?, role) {
            ("way", _) => Some(Self::Way),
            ("relation", Some("tributary")) => Some(Self::Tributary),
            ("relation", Some("side_stream")) => Some(Self::SideStream),
            _ => None,
        }
    }
}

/// A relation accumulated while its element is open.
///
/// # Examples
/// ```
/// use hydrograph_core::{MemberRole, Relation, RelationType};
///
/// let mut seine = Relation::new(100);
/// seine.apply_tag("type", "waterway");
/// seine.apply_tag("waterway", "river");
/// seine.apply_tag("name", "Seine");
/// seine.push_member(MemberRole::SideStream, 200);
///
/// assert_eq!(seine.resolved_type(), Some(RelationType::River));
/// assert_eq!(seine.resolved_name(), "Seine");
/// assert_eq!(seine.discarded, vec![200]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relation {
    /// Relation identifier.
    pub id: OsmId,
    /// Raw `name` tag.
    pub name: Option<String>,
    /// Raw `name:fr` tag.
    pub name_fr: Option<String>,
    /// Raw `type` tag.
    pub relation_type: Option<String>,
    /// Raw `waterway` tag.
    pub waterway: Option<String>,
    /// Raw `admin_level` tag.
    pub admin_level: Option<String>,
    /// Raw `boundary` tag.
    pub boundary: Option<String>,
    /// Raw `ref:sandre` tag (French national hydrographic reference).
    pub sandre_ref: Option<String>,
    /// Member way ids in document order.
    pub ways: Vec<OsmId>,
    /// Member relation ids with role `tributary`.
    pub tributaries: Vec<OsmId>,
    /// Member relation ids with role `side_stream`.
    pub discarded: Vec<OsmId>,
}

impl Relation {
    /// Start a relation with no members or tags.
    #[must_use]
    pub fn new(id: OsmId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Start a relation from its raw `id` attribute.
    pub fn from_attributes(id: Option<&str>) -> Result<Self, EntityError> {
        parse_osm_id(id).map(Self::new)
    }

    /// Append a classified member reference.
    pub fn push_member(&mut self, role: MemberRole, id: OsmId) {
        match role {
            MemberRole::Way => self.ways.push(id),
            MemberRole::Tributary => self.tributaries.push(id),
            MemberRole::SideStream => self.discarded.push(id),
        }
    }

    /// Record a tag if the key is one a relation tracks.
    ///
    /// Returns `false` for keys that are ignored.
    pub fn apply_tag(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "name" => &mut self.name,
            "name:fr" => &mut self.name_fr,
            "type" => &mut self.relation_type,
            "waterway" => &mut self.waterway,
            "admin_level" => &mut self.admin_level,
            "boundary" => &mut self.boundary,
            "ref:sandre" => &mut self.sandre_ref,
            _ => return false,
        };
        *slot = Some(value.to_owned());
        true
    }

    /// Display name: `name:fr`, then `name`, then `#<id>`.
    #[must_use]
    pub fn resolved_name(&self) -> Cow<'_, str> {
        [&self.name_fr, &self.name]
            .into_iter()
            .find_map(|candidate| candidate.as_deref().filter(|value| !value.is_empty()))
            .map_or_else(|| Cow::Owned(format!("#{}", self.id)), Cow::Borrowed)
    }

    /// River takes precedence over boundary when both rules match.
    #[must_use]
    pub fn resolved_type(&self) -> Option<RelationType> {
        let is_river = self.relation_type.as_deref() == Some("waterway")
            && matches!(self.waterway.as_deref(), Some("river" | "stream"));
        let is_boundary = self.admin_level.as_deref() == Some("8")
            && self.boundary.as_deref() == Some("administrative");

        if is_river {
            Some(RelationType::River)
        } else if is_boundary {
            Some(RelationType::Boundary)
        } else {
            None
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Relation #{}, {}", self.id, self.resolved_name())
    }
}
