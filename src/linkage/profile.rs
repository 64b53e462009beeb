// src/linkage/profile.rs - Named matching profiles and inline rule parsing
use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::{LinkageError, LinkageResult};
use crate::models::matching::{CompareRule, IndexRule, MatchingProfile};
use crate::utils::config::odd_window;

/// How the caller picks the rules for a run.
#[derive(Debug, Clone)]
pub enum ProfileSelector {
    Named(String),
    Inline(MatchingProfile),
}

impl ProfileSelector {
    pub fn resolve(&self, window: usize) -> LinkageResult<MatchingProfile> {
        match self {
            ProfileSelector::Named(name) => named_profile(name, window),
            ProfileSelector::Inline(profile) => Ok(profile.clone()),
        }
    }
}

const ZOOMINFO_COMPARE: [(&str, &str); 11] = [
    ("SF_AccountName", "ZI_AccountName"),
    ("SF_AccountNameClean", "ZI_AccountNameClean"),
    ("SF_WebsiteClean", "ZI_WebsiteClean"),
    ("SF_DomainClean", "ZI_DomainClean"),
    ("SF_BillingCity", "ZI_City"),
    ("SF_BillingStateClean", "ZI_StateClean"),
    ("SF_BillingPostalCode", "ZI_PostalCode"),
    ("SF_BillingCountryClean", "ZI_CountryClean"),
    ("SF_AnnualRevenue", "ZI_AnnualRevenue"),
    ("SF_NumberofEmployees", "ZI_NumberofEmployees"),
    ("SF_SIC", "ZI_SICCode"),
];

const DNB_COMPARE: [(&str, &str); 12] = [
    ("SF_AccountName", "DNB_BusinessName"),
    ("SF_AccountNameClean", "DNB_BusinessNameClean"),
    ("SF_WebsiteClean", "DNB_WebsiteClean"),
    ("SF_DomainClean", "DNB_DomainClean"),
    ("SF_BillingCity", "DNB_City"),
    ("SF_BillingStateClean", "DNB_StateClean"),
    ("SF_BillingPostalCode", "DNB_PostalCode"),
    ("SF_BillingCountryClean", "DNB_CountryClean"),
    ("SF_DUNSNumber", "DNB_DUNSNumber"),
    ("SF_AnnualRevenue", "DNB_AnnualRevenue"),
    ("SF_NumberofEmployees", "DNB_NumberofEmployees"),
    ("SF_SIC", "DNB_SICCode"),
];

const NAME_PAIRS: [(&str, &str); 3] = [
    ("SF_AccountName", "INP_Company"),
    ("SF_AccountName", "INP_Outreach_Account_Natural_Name"),
    ("SF_CleanName", "INP_Outreach_Account_Natural_Name"),
];

fn compare_rules(pairs: &[(&str, &str)]) -> Vec<CompareRule> {
    pairs.iter().map(|(l, r)| CompareRule::auto(l, r)).collect()
}

/// Built-in profile by name. Sorted-neighbour rules use `window`.
pub fn named_profile(name: &str, window: usize) -> LinkageResult<MatchingProfile> {
    let (index, compare) = match name {
        "ZoomInfo" => (
            vec![IndexRule::block("SF_AccountId", "ZI_AccountId")],
            compare_rules(&ZOOMINFO_COMPARE),
        ),
        "DNB" => (
            vec![IndexRule::block("SF_DNBCompanyProfile", "DNB_Id")],
            compare_rules(&DNB_COMPARE),
        ),
        "name" => (
            NAME_PAIRS
                .iter()
                .map(|(l, r)| IndexRule::SortedNeighbour {
                    left: l.to_string(),
                    right: r.to_string(),
                    window,
                })
                .collect(),
            compare_rules(&NAME_PAIRS),
        ),
        other => return Err(LinkageError::UnknownProfile(other.to_string())),
    };
    Ok(MatchingProfile {
        name: name.to_string(),
        index,
        compare,
    })
}

/// A right-hand side written either as a single field or a list of fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

impl OneOrMany {
    fn into_fields(self) -> Vec<String> {
        match self {
            OneOrMany::One(field) => vec![field],
            OneOrMany::Many(fields) => fields.into_iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct NestedIndex {
    #[serde(default)]
    block: BTreeMap<String, OneOrMany>,
    #[serde(default, alias = "sortedneighbourhood")]
    sortedneighbour: BTreeMap<String, OneOrMany>,
}

/// `{"index": {"block": {L: [R..]}, "sortedneighbour": {..}}, "compare": {L: [R..]}}`
#[derive(Debug, Deserialize)]
struct NestedRules {
    #[serde(default)]
    index: NestedIndex,
    #[serde(default)]
    compare: BTreeMap<String, OneOrMany>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    Typed(MatchingProfile),
    Nested(NestedRules),
}

fn flatten(map: BTreeMap<String, OneOrMany>) -> Vec<(String, String)> {
    map.into_iter()
        .flat_map(|(left, rights)| {
            rights
                .into_fields()
                .into_iter()
                .map(move |right| (left.clone(), right))
        })
        .collect()
}

/// Parse caller-supplied rules: either the typed profile schema or the nested mapping shape.
pub fn parse_rules(json: &str, window: usize) -> LinkageResult<MatchingProfile> {
    let nested = match serde_json::from_str::<RulesDocument>(json) {
        Ok(RulesDocument::Typed(mut profile)) => {
            for rule in &mut profile.index {
                if let IndexRule::SortedNeighbour { window, .. } = rule {
                    *window = odd_window(*window);
                }
            }
            return Ok(profile);
        }
        Ok(RulesDocument::Nested(nested)) => nested,
        // Re-parse as the nested shape so the error points at the offending field.
        Err(_) => serde_json::from_str::<NestedRules>(json)?,
    };

    let mut index: Vec<IndexRule> = flatten(nested.index.block)
        .into_iter()
        .map(|(l, r)| IndexRule::Block { left: l, right: r })
        .collect();
    index.extend(
        flatten(nested.index.sortedneighbour)
            .into_iter()
            .map(|(l, r)| IndexRule::SortedNeighbour {
                left: l,
                right: r,
                window,
            }),
    );
    let compare = flatten(nested.compare)
        .into_iter()
        .map(|(l, r)| CompareRule::auto(&l, &r))
        .collect();

    Ok(MatchingProfile {
        name: "custom".to_string(),
        index,
        compare,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::matching::{ComparisonKind, StringMethod};

    #[test]
    fn test_zoominfo_profile() {
        let profile = named_profile("ZoomInfo", 3).unwrap();
        assert_eq!(profile.index, vec![IndexRule::block("SF_AccountId", "ZI_AccountId")]);
        assert_eq!(profile.compare.len(), 11);
        assert!(profile
            .compare
            .iter()
            .any(|r| r.left == "SF_SIC" && r.right == "ZI_SICCode"));
    }

    #[test]
    fn test_dnb_profile_blocks_on_company_profile() {
        let profile = named_profile("DNB", 3).unwrap();
        assert_eq!(profile.index, vec![IndexRule::block("SF_DNBCompanyProfile", "DNB_Id")]);
        assert!(profile.compare.iter().any(|r| r.label() == "Match_DUNSNumber_DNB_DUNSNumber"));
    }

    #[test]
    fn test_name_profile_uses_window() {
        let profile = named_profile("name", 5).unwrap();
        assert_eq!(profile.index.len(), 3);
        assert!(profile.index.iter().all(|rule| matches!(
            rule,
            IndexRule::SortedNeighbour { window: 5, .. }
        )));
    }

    #[test]
    fn test_unknown_profile_is_fatal() {
        let err = named_profile("Clearbit", 3).unwrap_err();
        assert!(matches!(err, LinkageError::UnknownProfile(name) if name == "Clearbit"));
        assert!(ProfileSelector::Named("zoominfo".into()).resolve(3).is_err());
    }

    #[test]
    fn test_parse_nested_rules() {
        let json = r#"{
            "index": {"block": {"SF_AccountId": ["ZI_AccountId"]},
                      "sortedneighbour": {"SF_AccountName": "ZI_AccountName"}},
            "compare": {"SF_AccountName": ["ZI_AccountName", null, "ZI_LegalName"]}
        }"#;
        let profile = parse_rules(json, 3).unwrap();
        assert_eq!(
            profile.index,
            vec![
                IndexRule::block("SF_AccountId", "ZI_AccountId"),
                IndexRule::sorted_neighbour("SF_AccountName", "ZI_AccountName"),
            ]
        );
        let labels: Vec<String> = profile.compare.iter().map(CompareRule::label).collect();
        assert_eq!(
            labels,
            vec!["Match_AccountName_ZI_AccountName", "Match_AccountName_ZI_LegalName"]
        );
        let (left_cols, right_cols) = profile.referenced_columns();
        assert_eq!(left_cols.len(), 4);
        assert_eq!(right_cols[3], "ZI_LegalName");
    }

    #[test]
    fn test_parse_typed_rules() {
        let json = r#"{
            "name": "typed",
            "index": [{"type": "block", "left": "Id", "right": "Id"}],
            "compare": [{"left": "Name", "right": "Name",
                         "kind": {"kind": "string", "method": "jarowinkler", "threshold": 0.9}}]
        }"#;
        let profile = parse_rules(json, 3).unwrap();
        assert_eq!(profile.name, "typed");
        assert_eq!(
            profile.compare[0].kind,
            ComparisonKind::String {
                method: StringMethod::Jarowinkler,
                threshold: 0.9
            }
        );
    }

    #[test]
    fn test_typed_even_window_rounds_up() {
        let json = r#"{
            "name": "typed",
            "index": [{"type": "sorted_neighbour", "left": "Emp", "right": "Emp", "window": 4}],
            "compare": []
        }"#;
        let profile = parse_rules(json, 3).unwrap();
        assert!(matches!(
            profile.index[0],
            IndexRule::SortedNeighbour { window: 5, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_rules() {
        let err = parse_rules(r#"{"compare": {"SF_AccountName": 42}}"#, 3).unwrap_err();
        assert!(matches!(err, LinkageError::InvalidRules(_)));
    }
}
