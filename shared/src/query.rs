use crate::selection::MapTarget;

pub const ID_PARAM: &str = "id";
pub const TAXON_PARAM: &str = "taxon";

/// The map-identifying part of the page URL. `id` and `taxon` are never both
/// recorded by [`MapQuery::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapQuery {
    pub id: Option<String>,
    pub taxon: Option<String>,
}

impl MapQuery {
    /// Build from decoded query pairs. The first occurrence of a key wins.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key {
                ID_PARAM => &mut query.id,
                TAXON_PARAM => &mut query.taxon,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        query
    }

    /// Record `target`, clearing the other parameter.
    pub fn record(&mut self, target: &MapTarget) {
        match target {
            MapTarget::Id(id) => {
                self.id = Some(id.clone());
                self.taxon = None;
            }
            MapTarget::Taxon(taxon) => {
                self.taxon = Some(taxon.clone());
                self.id = None;
            }
        }
    }
}

/// Map service endpoint for a viewer page: the page location with its last
/// path segment removed (a trailing `/` drops one more), always ending in `/`.
pub fn map_endpoint(origin: &str, pathname: &str) -> String {
    let mut parts: Vec<&str> = pathname.split('/').collect();
    let drop = if parts.last() == Some(&"") { 2 } else { 1 };
    parts.truncate(parts.len().saturating_sub(drop));
    parts.push("");

    let path = parts.join("/");
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_occurrence_and_ignores_other_keys() {
        let query = MapQuery::from_pairs([
            ("taxon", "NCBITaxon:9606"),
            ("zoom", "3"),
            ("taxon", "NCBITaxon:10114"),
        ]);
        assert_eq!(query.id, None);
        assert_eq!(query.taxon.as_deref(), Some("NCBITaxon:9606"));
    }

    #[test]
    fn recording_id_clears_taxon() {
        let mut query = MapQuery::from_pairs([("taxon", "T1")]);
        query.record(&MapTarget::Id("m1".into()));
        assert_eq!(query.id.as_deref(), Some("m1"));
        assert_eq!(query.taxon, None);
    }

    #[test]
    fn recording_taxon_clears_id() {
        let mut query = MapQuery::from_pairs([("id", "m1")]);
        query.record(&MapTarget::Taxon("T1".into()));
        assert_eq!(query.taxon.as_deref(), Some("T1"));
        assert_eq!(query.id, None);
    }

    #[test]
    fn endpoint_drops_page_segment() {
        assert_eq!(
            map_endpoint("https://maps.example", "/viewer/index.html"),
            "https://maps.example/viewer/"
        );
    }

    #[test]
    fn endpoint_drops_directory_when_path_ends_with_slash() {
        assert_eq!(
            map_endpoint("https://maps.example", "/flatmap/viewer/"),
            "https://maps.example/flatmap/"
        );
    }

    #[test]
    fn endpoint_for_root_keeps_trailing_slash() {
        assert_eq!(map_endpoint("http://localhost:3000", "/"), "http://localhost:3000/");
        assert_eq!(map_endpoint("http://localhost:3000", ""), "http://localhost:3000/");
    }
}
