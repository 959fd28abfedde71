//! Entity model for the Hydrograph ingestion pipeline.
//!
//! The three OpenStreetMap element kinds the pipeline cares about are modelled
//! as plain records that accumulate attributes and tags while their markup is
//! open. Derived fields (display name and semantic type) are computed by
//! explicit accessors rather than stored, so the value seen at staging time is
//! always a function of what was accumulated up to the element's close.
//!
//! Constructors are fallible: an element whose identifier or coordinates fail
//! to parse produces an [`EntityError`] and the caller decides whether to skip
//! it.
#![forbid(unsafe_code)]

mod error;
mod id;
pub mod node;
pub mod relation;
pub mod way;

pub use error::EntityError;
pub use id::{OsmId, parse_osm_id, parse_reference};
pub use node::{Node, SRID};
pub use relation::{MemberRole, Relation, RelationType};
pub use way::{Way, WayType};
