use crate::catalog::LogicalGroup;

/// Label of the leading "no selection" option.
pub const PLACEHOLDER_LABEL: &str = "Select flatmap...";

/// What the map service is asked to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    Id(String),
    Taxon(String),
}

impl MapTarget {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Taxon(taxon) => taxon,
        }
    }
}

/// Outcome of resolving the initial map.
///
/// `selected` indexes the selector options, where index 0 is the placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub target: Option<MapTarget>,
    pub selected: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOption {
    /// Map id, empty for the placeholder.
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Decide which map to open from the requested id/taxon and the
/// display-ordered groups.
///
/// An id match wins over a taxon match wherever it appears. Requests that
/// match nothing are still passed through (id before taxon). With no request
/// at all the newest map is the default.
pub fn resolve_initial_target(
    requested_id: Option<&str>,
    requested_taxon: Option<&str>,
    ordered: &[LogicalGroup],
) -> Resolution {
    let mut id_match: Option<usize> = None;
    let mut taxon_match: Option<usize> = None;

    for (pos, group) in ordered.iter().enumerate() {
        if requested_id.is_some_and(|id| group.map.id == id) {
            id_match = Some(pos);
            break;
        }
        if taxon_match.is_none()
            && requested_taxon.is_some()
            && group.map.describes.as_deref() == requested_taxon
        {
            taxon_match = Some(pos);
        }
    }

    if let Some(pos) = id_match {
        return Resolution {
            target: Some(MapTarget::Id(ordered[pos].map.id.clone())),
            selected: Some(pos + 1),
        };
    }
    if let (Some(pos), Some(taxon)) = (taxon_match, requested_taxon) {
        return Resolution {
            target: Some(MapTarget::Taxon(taxon.to_string())),
            selected: Some(pos + 1),
        };
    }
    if let Some(id) = requested_id {
        return Resolution {
            target: Some(MapTarget::Id(id.to_string())),
            selected: None,
        };
    }
    if let Some(taxon) = requested_taxon {
        return Resolution {
            target: Some(MapTarget::Taxon(taxon.to_string())),
            selected: None,
        };
    }

    match ordered.first() {
        Some(newest) => Resolution {
            target: Some(MapTarget::Id(newest.map.id.clone())),
            selected: Some(1),
        },
        None => Resolution::default(),
    }
}

/// Selector entries: the placeholder, then one option per group labelled
/// `"<display key> -- <created>"`.
pub fn selector_options(ordered: &[LogicalGroup], resolution: &Resolution) -> Vec<SelectorOption> {
    let mut options = Vec::with_capacity(ordered.len() + 1);
    options.push(SelectorOption {
        value: String::new(),
        label: PLACEHOLDER_LABEL.to_string(),
        selected: resolution.selected.is_none(),
    });
    for (pos, group) in ordered.iter().enumerate() {
        options.push(SelectorOption {
            value: group.map.id.clone(),
            label: format!("{} -- {}", group.key, group.map.created),
            selected: resolution.selected == Some(pos + 1),
        });
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MapDescriptor;

    fn group(id: &str, describes: &str, created: &str) -> LogicalGroup {
        let map = MapDescriptor {
            id: id.to_string(),
            name: None,
            describes: Some(describes.to_string()),
            created: created.to_string(),
        };
        LogicalGroup {
            key: map.display_key(),
            map,
        }
    }

    fn ordered() -> Vec<LogicalGroup> {
        vec![group("A", "T1", "2"), group("B", "T2", "1")]
    }

    #[test]
    fn id_match_beats_earlier_taxon_match() {
        let resolution = resolve_initial_target(Some("B"), Some("T1"), &ordered());
        assert_eq!(resolution.target, Some(MapTarget::Id("B".into())));
        assert_eq!(resolution.selected, Some(2));
    }

    #[test]
    fn taxon_match_selects_first_describing_map() {
        let groups = vec![group("A", "T1", "3"), group("B", "T2", "2"), group("C", "T2", "1")];
        let resolution = resolve_initial_target(None, Some("T2"), &groups);
        assert_eq!(resolution.target, Some(MapTarget::Taxon("T2".into())));
        assert_eq!(resolution.selected, Some(2));
    }

    #[test]
    fn defaults_to_first_real_option() {
        let resolution = resolve_initial_target(None, None, &ordered());
        assert_eq!(resolution.target, Some(MapTarget::Id("A".into())));
        assert_eq!(resolution.selected, Some(1));

        let options = selector_options(&ordered(), &resolution);
        assert_eq!(options[0].label, PLACEHOLDER_LABEL);
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(options[1].value, "A");
    }

    #[test]
    fn empty_catalog_without_request_selects_nothing() {
        let resolution = resolve_initial_target(None, None, &[]);
        assert_eq!(resolution, Resolution::default());

        let options = selector_options(&[], &resolution);
        assert_eq!(options.len(), 1);
        assert!(options[0].selected);
    }

    #[test]
    fn unmatched_requests_pass_through() {
        let resolution = resolve_initial_target(Some("Z"), Some("T9"), &ordered());
        assert_eq!(resolution.target, Some(MapTarget::Id("Z".into())));
        assert_eq!(resolution.selected, None);

        let resolution = resolve_initial_target(None, Some("T9"), &ordered());
        assert_eq!(resolution.target, Some(MapTarget::Taxon("T9".into())));
    }

    #[test]
    fn matched_taxon_wins_over_unmatched_id() {
        let resolution = resolve_initial_target(Some("Z"), Some("T2"), &ordered());
        assert_eq!(resolution.target, Some(MapTarget::Taxon("T2".into())));
        assert_eq!(resolution.selected, Some(2));
    }

    #[test]
    fn option_labels_carry_key_and_created() {
        let options = selector_options(&ordered(), &Resolution::default());
        assert_eq!(options[1].label, "T1 -- A -- 2");
        assert_eq!(options[2].label, "T2 -- B -- 1");
    }

    #[test]
    fn target_text_ignores_kind() {
        assert_eq!(MapTarget::Id("x".into()).as_str(), "x");
        assert_eq!(MapTarget::Taxon("x".into()).as_str(), "x");
    }
}
