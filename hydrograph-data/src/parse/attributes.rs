use std::str;

use log::debug;
use quick_xml::events::BytesStart;

/// Decoded attributes of a single element.
///
/// Malformed attributes (bad quoting, duplicate keys, invalid escapes or
/// non-UTF-8 text) are dropped, so the element behaves as if the attribute
/// were absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    pairs: Vec<(String, String)>,
}

impl ElementAttributes {
    /// Decode the attributes of a start or empty element.
    #[must_use]
    pub fn from_start(start: &BytesStart<'_>) -> Self {
        let mut pairs = Vec::new();
        for attribute in start.attributes() {
            let attribute = match attribute {
                Ok(attribute) => attribute,
                Err(err) => {
                    debug!("Dropped malformed attribute: {err}");
                    continue;
                }
            };
            let Ok(key) = str::from_utf8(attribute.key.as_ref()) else {
                debug!("Dropped attribute with non-UTF-8 key");
                continue;
            };
            match attribute.unescape_value() {
                Ok(value) => pairs.push((key.to_owned(), value.into_owned())),
                Err(err) => debug!("Dropped attribute {key:?}: {err}"),
            }
        }
        Self { pairs }
    }

    /// Value of the first attribute named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for ElementAttributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
