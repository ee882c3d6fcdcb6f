//! Entity records returned by the search API and the set they merge into.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single place as reported by the search API.
///
/// Only the identifier is interpreted. Every other field is carried verbatim
/// in `attributes` and written back out unchanged, so the JSON form matches
/// the wire payload.
///
/// # Examples
///
/// ```
/// use placesweep_core::Place;
/// use serde_json::json;
///
/// let place: Place = serde_json::from_value(json!({
///     "place_id": "abc",
///     "name": "Diner",
///     "rating": 4.5,
/// }))?;
/// assert_eq!(place.id, "abc");
/// assert_eq!(place.attributes["name"], "Diner");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Unique identifier used as the deduplication key.
    #[serde(rename = "place_id")]
    pub id: String,
    /// Remaining fields of the payload.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Place {
    /// Construct a place from an identifier and attribute bag.
    pub fn new(id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Construct a place with no attributes besides its identifier.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::new(id, Map::new())
    }
}

/// Places keyed by identifier.
///
/// Inserting an identifier that is already present replaces the earlier
/// record. Records for one identifier are expected to match across
/// overlapping queries, so last-write-wins loses nothing. Iteration and
/// serialisation are ordered by identifier. Deserialising rekeys every record
/// by its own identifier, whatever key it was stored under.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    places: BTreeMap<String, Place>,
}

impl ResultSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `place`, replacing any record with the same identifier.
    pub fn insert(&mut self, place: Place) {
        self.places.insert(place.id.clone(), place);
    }

    /// Merge every record of `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        self.places.extend(other.places);
    }

    /// Number of distinct identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether the set holds no places.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Whether a place with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.places.contains_key(id)
    }

    /// Look up a place by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Place> {
        self.places.get(id)
    }

    /// Iterate identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.places.keys().map(String::as_str)
    }

    /// Iterate places in identifier order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Place> {
        self.places.values()
    }
}

impl<'de> Deserialize<'de> for ResultSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = BTreeMap::<String, Place>::deserialize(deserializer)?;
        Ok(stored.into_values().collect())
    }
}

impl Extend<Place> for ResultSet {
    fn extend<I: IntoIterator<Item = Place>>(&mut self, iter: I) {
        for place in iter {
            self.insert(place);
        }
    }
}

impl FromIterator<Place> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Place>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for ResultSet {
    type Item = Place;
    type IntoIter = btree_map::IntoValues<String, Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.into_values()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Place;
    type IntoIter = btree_map::Values<'a, String, Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.values()
    }
}
