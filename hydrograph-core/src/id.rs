use crate::EntityError;

/// Identifier of a node, way or relation.
///
/// The three kinds do not share a namespace; an `OsmId` carries no kind.
pub type OsmId = i64;

/// Parse an identifier or reference attribute.
///
/// Surrounding ASCII whitespace is tolerated; anything else that is not a
/// base-10 integer is rejected.
///
/// # Examples
/// ```
/// use hydrograph_core::{EntityError, parse_osm_id};
///
/// assert_eq!(parse_osm_id(Some(" 42 ")), Ok(42));
/// assert!(matches!(parse_osm_id(Some("4x2")), Err(EntityError::InvalidId { .. })));
/// assert!(matches!(parse_osm_id(None), Err(EntityError::MissingAttribute { .. })));
/// ```
pub fn parse_osm_id(raw: Option<&str>) -> Result<OsmId, EntityError> {
    parse_integer("id", raw)
}

/// Parse the `ref` attribute of an `nd` or `member` element.
///
/// Same rules as [`parse_osm_id`]; only the reported attribute name differs.
pub fn parse_reference(raw: Option<&str>) -> Result<OsmId, EntityError> {
    parse_integer("ref", raw)
}

fn parse_integer(attribute: &'static str, raw: Option<&str>) -> Result<OsmId, EntityError> {
    let raw = raw.ok_or(EntityError::MissingAttribute { attribute })?;
    raw.trim()
        .parse::<OsmId>()
        .map_err(|_| EntityError::InvalidId {
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("-17", -17)]
    #[case("\t9000000000 ", 9_000_000_000)]
    fn parses_integers(#[case] raw: &str, #[case] expected: OsmId) {
        assert_eq!(parse_osm_id(Some(raw)), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("1.5")]
    #[case("abc")]
    #[case("99999999999999999999")]
    fn rejects_non_integers(#[case] raw: &str) {
        assert_eq!(
            parse_osm_id(Some(raw)),
            Err(EntityError::InvalidId {
                value: raw.to_owned()
            })
        );
    }

    #[rstest]
    fn missing_reference_names_ref_attribute() {
        assert_eq!(
            parse_reference(None),
            Err(EntityError::MissingAttribute { attribute: "ref" })
        );
    }
}
