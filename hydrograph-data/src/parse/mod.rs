//! OSM XML reader driving the [`OsmHandler`] state machine.
//!
//! The reader is single-pass and streaming: each element is decoded, applied
//! to the handler and dropped before the next event is read. Self-closing
//! elements (`<node .../>`) are treated as an open immediately followed by a
//! close.
#![forbid(unsafe_code)]

mod attributes;
mod handler;

use std::{error::Error as StdError, io::BufRead, str};

use log::info;
use quick_xml::{events::Event, reader::Reader};
use thiserror::Error;

pub use attributes::ElementAttributes;
pub use handler::{EntitySink, OsmHandler, ParseStats};

/// Errors that abort a parse.
///
/// Malformed entities never appear here; they are skipped and counted in
/// [`ParseStats`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The markup is not well-formed.
    #[error("malformed OSM XML near byte {position}")]
    Xml {
        /// Reader offset when the error was raised.
        position: usize,
        /// Underlying reader error.
        #[source]
        source: quick_xml::Error,
    },
    /// The sink rejected a finished entity.
    #[error("failed to stage entity")]
    Sink {
        /// Error raised by the sink.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Parse an OSM XML document, handing every finished entity to `sink`.
///
/// # Examples
/// ```
/// use std::convert::Infallible;
/// use hydrograph_core::{Node, Relation, Way};
/// use hydrograph_data::{EntitySink, read_osm_xml};
///
/// #[derive(Default)]
/// struct Ids(Vec<i64>);
///
/// impl EntitySink for Ids {
///     type Error = Infallible;
///     fn accept_node(&mut self, node: &Node) -> Result<(), Infallible> {
///         self.0.push(node.id);
///         Ok(())
///     }
///     fn accept_way(&mut self, _: &Way) -> Result<(), Infallible> { Ok(()) }
///     fn accept_relation(&mut self, _: &Relation) -> Result<(), Infallible> { Ok(()) }
/// }
///
/// let xml = br#"<osm><node id="1" lon="2.5" lat="48.8"/><node id="x" lon="0" lat="0"/></osm>"#;
/// let mut ids = Ids::default();
/// let stats = read_osm_xml(&xml[..], &mut ids)?;
///
/// assert_eq!(ids.0, vec![1]);
/// assert_eq!(stats.skipped_nodes, 1);
/// # Ok::<(), hydrograph_data::ParseError>(())
/// ```
pub fn read_osm_xml<R, S>(reader: R, sink: &mut S) -> Result<ParseStats, ParseError>
where
    R: BufRead,
    S: EntitySink,
{
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);
    let mut handler = OsmHandler::new();
    let mut buf = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Err(source) => {
                return Err(ParseError::Xml {
                    position: xml.buffer_position(),
                    source,
                });
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                let name = start.name();
                let attributes = ElementAttributes::from_start(&start);
                handler.open_element(element_name(name.as_ref()), &attributes);
            }
            Ok(Event::Empty(start)) => {
                let name = start.name();
                let attributes = ElementAttributes::from_start(&start);
                handler.open_element(element_name(name.as_ref()), &attributes);
                close(&mut handler, element_name(name.as_ref()), sink)?;
            }
            Ok(Event::End(end)) => {
                let name = end.name();
                close(&mut handler, element_name(name.as_ref()), sink)?;
            }
            Ok(_) => {}
        }
        buf.clear();
    }

    let stats = handler.into_stats();
    info!(
        "Parsed {} nodes, {} ways and {} relations ({} nodes, {} ways, {} relations and {} references skipped)",
        stats.nodes,
        stats.ways,
        stats.relations,
        stats.skipped_nodes,
        stats.skipped_ways,
        stats.skipped_relations,
        stats.skipped_references,
    );
    Ok(stats)
}

fn close<S: EntitySink>(
    handler: &mut OsmHandler,
    name: &str,
    sink: &mut S,
) -> Result<(), ParseError> {
    handler
        .close_element(name, sink)
        .map_err(|source| ParseError::Sink {
            source: Box::new(source),
        })
}

// Names outside the OSM vocabulary are ignored, so a lossy fallback is enough.
fn element_name(raw: &[u8]) -> &str {
    str::from_utf8(raw).unwrap_or_default()
}
