use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One published version of a flatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Taxon the map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub describes: Option<String>,
    /// ISO-8601 creation time. Compared as text.
    #[serde(default)]
    pub created: String,
}

impl MapDescriptor {
    /// Key grouping the versions of one logical map: `describes -- name`,
    /// with the id standing in for a missing name.
    pub fn display_key(&self) -> String {
        let name = self.name.as_deref().unwrap_or(&self.id);
        match self.describes.as_deref() {
            Some(taxon) => format!("{taxon} -- {name}"),
            None => name.to_string(),
        }
    }
}

/// Catalog of map versions keyed by id, in the order the producer listed them.
///
/// Decodes from either a JSON object keyed by id or a JSON array of
/// descriptors; always encodes as the keyed object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapCatalog {
    maps: Vec<MapDescriptor>,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor. A descriptor with an id already present replaces
    /// the old one in place.
    pub fn insert(&mut self, map: MapDescriptor) {
        match self.maps.iter_mut().find(|existing| existing.id == map.id) {
            Some(existing) => *existing = map,
            None => self.maps.push(map),
        }
    }

    pub fn get(&self, id: &str) -> Option<&MapDescriptor> {
        self.maps.iter().find(|map| map.id == id)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MapDescriptor> {
        self.maps.iter()
    }
}

impl FromIterator<MapDescriptor> for MapCatalog {
    fn from_iter<I: IntoIterator<Item = MapDescriptor>>(iter: I) -> Self {
        let mut catalog = MapCatalog::new();
        for map in iter {
            catalog.insert(map);
        }
        catalog
    }
}

impl Serialize for MapCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.maps.len()))?;
        for map in &self.maps {
            out.serialize_entry(&map.id, map)?;
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for MapCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = MapCatalog;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object of map descriptors keyed by id, or an array of descriptors")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MapCatalog, A::Error> {
        let mut catalog = MapCatalog::new();
        while let Some((key, mut map)) = access.next_entry::<String, MapDescriptor>()? {
            if map.id.is_empty() {
                map.id = key;
            }
            catalog.insert(map);
        }
        Ok(catalog)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<MapCatalog, A::Error> {
        let mut catalog = MapCatalog::new();
        while let Some(map) = access.next_element::<MapDescriptor>()? {
            catalog.insert(map);
        }
        Ok(catalog)
    }
}

/// Newest version of one logical map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalGroup {
    pub key: String,
    pub map: MapDescriptor,
}

/// Collapse a catalog to one descriptor per display key, keeping the most
/// recently created version. Groups stay in the order their key was first
/// seen; equal `created` values keep the first descriptor.
pub fn build_logical_groups(catalog: &MapCatalog) -> Vec<LogicalGroup> {
    let mut groups: Vec<LogicalGroup> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for map in catalog.iter() {
        let key = map.display_key();
        match slots.get(&key) {
            Some(&slot) => {
                if groups[slot].map.created < map.created {
                    groups[slot].map = map.clone();
                }
            }
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push(LogicalGroup {
                    key,
                    map: map.clone(),
                });
            }
        }
    }

    groups
}

/// Most recent first. The sort is stable, so equal timestamps keep their
/// relative order.
pub fn order_for_display(groups: &[LogicalGroup]) -> Vec<LogicalGroup> {
    let mut ordered = groups.to_vec();
    ordered.sort_by(|a, b| b.map.created.cmp(&a.map.created));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(id: &str, name: Option<&str>, describes: Option<&str>, created: &str) -> MapDescriptor {
        MapDescriptor {
            id: id.to_string(),
            name: name.map(str::to_string),
            describes: describes.map(str::to_string),
            created: created.to_string(),
        }
    }

    fn sample_catalog() -> MapCatalog {
        [
            map("rat-v1", Some("rat"), Some("NCBITaxon:10114"), "2020-01-01T00:00:00"),
            map("human-v1", Some("body"), Some("NCBITaxon:9606"), "2020-03-01T00:00:00"),
            map("rat-v2", Some("rat"), Some("NCBITaxon:10114"), "2021-06-01T00:00:00"),
            map("anon", None, None, "2019-05-01T00:00:00"),
            map("human-v0", Some("body"), Some("NCBITaxon:9606"), "2019-01-01T00:00:00"),
            map("cat-a", Some("cat"), Some("NCBITaxon:9685"), "2021-06-01T00:00:00"),
            map("cat-b", Some("cat"), Some("NCBITaxon:9685"), "2021-06-01T00:00:00"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn display_key_joins_taxon_and_name() {
        let m = map("x", Some("body"), Some("NCBITaxon:9606"), "");
        assert_eq!(m.display_key(), "NCBITaxon:9606 -- body");
    }

    #[test]
    fn display_key_falls_back_to_id() {
        assert_eq!(map("x1", None, Some("T"), "").display_key(), "T -- x1");
        assert_eq!(map("x1", None, None, "").display_key(), "x1");
    }

    #[test]
    fn grouping_keeps_newest_version_per_key() {
        let catalog = sample_catalog();
        let groups = build_logical_groups(&catalog);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "NCBITaxon:10114 -- rat",
                "NCBITaxon:9606 -- body",
                "anon",
                "NCBITaxon:9685 -- cat",
            ]
        );
        assert_eq!(groups[0].map.id, "rat-v2");
        assert_eq!(groups[1].map.id, "human-v1");

        for group in &groups {
            for m in catalog.iter().filter(|m| m.display_key() == group.key) {
                assert!(m.created <= group.map.created);
            }
        }
    }

    #[test]
    fn grouping_tie_keeps_first_seen() {
        let groups = build_logical_groups(&sample_catalog());
        let cat = groups
            .iter()
            .find(|g| g.key == "NCBITaxon:9685 -- cat")
            .expect("cat group");
        assert_eq!(cat.map.id, "cat-a");
    }

    #[test]
    fn grouping_is_idempotent() {
        let catalog = sample_catalog();
        assert_eq!(build_logical_groups(&catalog), build_logical_groups(&catalog));
    }

    #[test]
    fn ordering_is_non_increasing_and_stable() {
        let groups = build_logical_groups(&sample_catalog());
        let ordered = order_for_display(&groups);

        for pair in ordered.windows(2) {
            assert!(pair[0].map.created >= pair[1].map.created);
        }
        // rat and cat share a timestamp; rat was seen first.
        let ids: Vec<&str> = ordered.iter().map(|g| g.map.id.as_str()).collect();
        assert_eq!(ids, vec!["rat-v2", "cat-a", "human-v1", "anon"]);
    }

    #[test]
    fn catalog_decodes_keyed_object_in_document_order() {
        let json = r#"{
            "zeta": {"id": "zeta", "created": "2020"},
            "alpha": {"name": "a", "created": "2021"}
        }"#;
        let catalog: MapCatalog = serde_json::from_str(json).expect("parse catalog");
        let ids: Vec<&str> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
        assert_eq!(catalog.get("alpha").and_then(|m| m.name.as_deref()), Some("a"));
    }

    #[test]
    fn catalog_decodes_array_and_encodes_keyed() {
        let json = r#"[{"id": "m1", "describes": "T1", "created": "2020", "source": "x"}]"#;
        let catalog: MapCatalog = serde_json::from_str(json).expect("parse catalog");
        assert_eq!(catalog.len(), 1);

        let encoded = serde_json::to_value(&catalog).expect("encode catalog");
        assert_eq!(encoded["m1"]["describes"], "T1");
        assert!(encoded["m1"].get("name").is_none());
    }

    #[test]
    fn catalog_insert_replaces_same_id_in_place() {
        let mut catalog = MapCatalog::new();
        catalog.insert(map("a", None, None, "1"));
        catalog.insert(map("b", None, None, "2"));
        catalog.insert(map("a", None, None, "3"));
        let created: Vec<&str> = catalog.iter().map(|m| m.created.as_str()).collect();
        assert_eq!(created, vec!["3", "2"]);
    }
}
