//! Disjunctive faceting
//!
//! A disjunctive facet combines its selected values with `OR`, and its
//! counts must ignore its own refinement: otherwise selecting `red` would
//! hide every other color. One logical search therefore becomes
//! `1 + n` queries:
//!
//! - a global query with every refinement applied, returning the hits;
//! - one facet-only query per disjunctive facet, with that facet's own
//!   refinement left out of the filters.
//!
//! The responses are merged positionally: response 0 belongs to the global
//! query, response `i` to the `i`-th disjunctive facet in sorted order.

use crate::models::{FacetCounts, Query, SearchResponse};
use algolia_core::{TransportError, TransportResult};
use std::collections::{BTreeMap, BTreeSet};

/// Applied refinements: attribute name to selected values
pub type Refinements = BTreeMap<String, Vec<String>>;

/// Refinement state of a faceted search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisjunctiveFaceting {
    refinements: Refinements,
    disjunctive_facets: BTreeSet<String>,
}

impl DisjunctiveFaceting {
    /// Create a faceting state
    pub fn new<I, S>(refinements: Refinements, disjunctive_facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            refinements,
            disjunctive_facets: disjunctive_facets.into_iter().map(Into::into).collect(),
        }
    }

    /// Builder-style method to add a refined value
    #[must_use]
    pub fn with_refinement(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.refinements
            .entry(attribute.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Applied refinements
    #[must_use]
    pub fn refinements(&self) -> &Refinements {
        &self.refinements
    }

    /// Disjunctive facets, sorted
    #[must_use]
    pub fn disjunctive_facets(&self) -> &BTreeSet<String> {
        &self.disjunctive_facets
    }

    /// Whether `attribute` is disjunctive
    #[must_use]
    pub fn is_disjunctive(&self, attribute: &str) -> bool {
        self.disjunctive_facets.contains(attribute)
    }

    /// Filter expression for the refinements, optionally leaving one out
    ///
    /// Attributes are visited in name order and attributes without values
    /// are skipped. Values of a disjunctive attribute are joined with `OR`,
    /// others with `AND`; each attribute's clause is parenthesised and the
    /// clauses are joined with `AND`.
    #[must_use]
    pub fn build_filters(&self, excluding: Option<&str>) -> String {
        self.refinements
            .iter()
            .filter(|(attribute, values)| {
                Some(attribute.as_str()) != excluding && !values.is_empty()
            })
            .map(|(attribute, values)| {
                let operator = if self.is_disjunctive(attribute) { " OR " } else { " AND " };
                let name = escape_token(attribute);
                let clause = values
                    .iter()
                    .map(|value| format!("{name}:{}", escape_token(value)))
                    .collect::<Vec<_>>()
                    .join(operator);
                format!("({clause})")
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Global query followed by one facet-only query per disjunctive facet
    #[must_use]
    pub fn make_queries(&self, base: &Query) -> Vec<Query> {
        let mut queries = Vec::with_capacity(self.disjunctive_facets.len() + 1);

        let mut global = base.clone();
        global.filters = combine_filters(base.filters.as_deref(), self.build_filters(None));
        queries.push(global);

        for facet in &self.disjunctive_facets {
            let mut query = base.clone();
            query.facets = Some(vec![facet.clone()]);
            query.filters =
                combine_filters(base.filters.as_deref(), self.build_filters(Some(facet)));
            query.hits_per_page = Some(0);
            query.attributes_to_retrieve = Some(Vec::new());
            query.attributes_to_highlight = Some(Vec::new());
            query.attributes_to_snippet = Some(Vec::new());
            query.analytics = Some(false);
            queries.push(query);
        }

        queries
    }

    /// Merge the responses of [`make_queries`](Self::make_queries)
    ///
    /// Exactly one response per query is required: an empty list fails with
    /// `EmptyResponses`, any other count with `ResponseCountMismatch`.
    ///
    /// Non-facet fields come from the global response. Counts of each
    /// disjunctive facet come from its own query, with a zero entry for
    /// every refined value the engine did not return. Facet statistics are
    /// merged with later responses winning, and `exhaustiveFacetsCount` is
    /// only true when every response says so (absent counts as true).
    pub fn merge_responses(
        &self,
        responses: Vec<SearchResponse>,
    ) -> TransportResult<SearchResponse> {
        let expected = self.disjunctive_facets.len() + 1;
        if responses.is_empty() {
            return Err(TransportError::EmptyResponses);
        }
        if responses.len() != expected {
            return Err(TransportError::ResponseCountMismatch {
                expected,
                received: responses.len(),
            });
        }

        let mut responses = responses.into_iter();
        let mut merged = responses.next().ok_or(TransportError::EmptyResponses)?;

        let mut exhaustive = merged.exhaustive_facets_count.unwrap_or(true);
        let mut facets = merged.facets.take().unwrap_or_default();
        let mut facets_stats = merged.facets_stats.take().unwrap_or_default();
        let mut disjunctive_facets = BTreeMap::new();

        let mut facet_names = self.disjunctive_facets.iter();
        for response in responses {
            exhaustive &= response.exhaustive_facets_count.unwrap_or(true);
            facets_stats.extend(response.facets_stats.unwrap_or_default());

            let mut returned = response.facets.unwrap_or_default();
            if let Some(facet) = facet_names.next() {
                let mut counts = returned.remove(facet).unwrap_or_default();
                self.fill_refined_values(facet, &mut counts);
                disjunctive_facets.insert(facet.clone(), counts);
            }
            // Anything else the engine returned is kept as is
            for (facet, counts) in returned {
                facets.entry(facet).or_insert(counts);
            }
        }

        for (facet, counts) in &disjunctive_facets {
            facets.insert(facet.clone(), counts.clone());
        }

        merged.facets = (!facets.is_empty()).then_some(facets);
        merged.facets_stats = (!facets_stats.is_empty()).then_some(facets_stats);
        merged.disjunctive_facets = (!disjunctive_facets.is_empty()).then_some(disjunctive_facets);
        merged.exhaustive_facets_count = Some(exhaustive);
        Ok(merged)
    }

    /// A selected value must stay visible even when nothing matches it
    fn fill_refined_values(&self, facet: &str, counts: &mut FacetCounts) {
        for value in self.refinements.get(facet).into_iter().flatten() {
            counts.entry(value.clone()).or_insert(0);
        }
    }
}

fn combine_filters(existing: Option<&str>, generated: String) -> Option<String> {
    match existing.filter(|f| !f.trim().is_empty()) {
        Some(existing) if !generated.is_empty() => Some(format!("({existing}) AND {generated}")),
        Some(existing) => Some(existing.to_string()),
        None if !generated.is_empty() => Some(generated),
        None => None,
    }
}

/// Filter operators; a bare token spelled like one would be parsed as such
const KEYWORDS: [&str; 4] = ["AND", "OR", "NOT", "TO"];

/// Quote attribute names and values that would not parse as a bare token
fn escape_token(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || KEYWORDS.iter().any(|k| value.eq_ignore_ascii_case(k))
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ':' | '"' | '\'' | ','));

    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn faceting() -> DisjunctiveFaceting {
        DisjunctiveFaceting::new(Refinements::new(), ["color"])
            .with_refinement("color", "red")
            .with_refinement("color", "blue")
            .with_refinement("brand", "nike")
    }

    fn facet_response(
        facet: &str,
        counts: &[(&str, u64)],
        exhaustive: Option<bool>,
    ) -> SearchResponse {
        let counts = counts.iter().map(|(v, c)| (v.to_string(), *c)).collect();
        SearchResponse {
            facets: Some(BTreeMap::from([(facet.to_string(), counts)])),
            exhaustive_facets_count: exhaustive,
            ..SearchResponse::default()
        }
    }

    #[test]
    fn test_global_filters() {
        assert_eq!(
            faceting().build_filters(None),
            "(brand:nike) AND (color:red OR color:blue)"
        );
    }

    #[test]
    fn test_filters_excluding_disjunctive_facet() {
        assert_eq!(faceting().build_filters(Some("color")), "(brand:nike)");
    }

    #[test]
    fn test_conjunctive_values_joined_with_and() {
        let f = DisjunctiveFaceting::new(Refinements::new(), Vec::<String>::new())
            .with_refinement("tag", "new")
            .with_refinement("tag", "sale");
        assert_eq!(f.build_filters(None), "(tag:new AND tag:sale)");
    }

    #[test]
    fn test_empty_refinements_are_skipped() {
        let mut refinements = Refinements::new();
        refinements.insert("color".into(), Vec::new());
        refinements.insert("size".into(), vec!["M".into()]);

        let f = DisjunctiveFaceting::new(refinements, ["color", "size"]);
        assert_eq!(f.build_filters(None), "(size:M)");
        assert_eq!(f.build_filters(Some("size")), "");
    }

    #[test]
    fn test_values_with_spaces_are_quoted() {
        let f = DisjunctiveFaceting::new(Refinements::new(), ["brand"])
            .with_refinement("brand", "Hugo Boss")
            .with_refinement("brand", "Levi's");
        assert_eq!(
            f.build_filters(None),
            r#"(brand:"Hugo Boss" OR brand:"Levi's")"#
        );
    }

    #[test]
    fn test_attribute_names_and_keywords_are_quoted() {
        let f = DisjunctiveFaceting::new(Refinements::new(), ["product type"])
            .with_refinement("product type", "shoes")
            .with_refinement("product type", "OR")
            .with_refinement("size", "to")
            .with_refinement("size", "Notebook");
        assert_eq!(
            f.build_filters(None),
            r#"("product type":shoes OR "product type":"OR") AND (size:"to" AND size:Notebook)"#
        );
    }

    #[test]
    fn test_make_queries() {
        let base = Query::new("shoes").with_hits_per_page(20);
        let queries = faceting().make_queries(&base);
        assert_eq!(queries.len(), 2);

        let global = &queries[0];
        assert_eq!(global.query.as_deref(), Some("shoes"));
        assert_eq!(global.hits_per_page, Some(20));
        assert_eq!(
            global.filters.as_deref(),
            Some("(brand:nike) AND (color:red OR color:blue)")
        );

        let color = &queries[1];
        assert_eq!(color.facets, Some(vec!["color".to_string()]));
        assert_eq!(color.filters.as_deref(), Some("(brand:nike)"));
        assert_eq!(color.hits_per_page, Some(0));
        assert_eq!(color.attributes_to_retrieve, Some(Vec::new()));
        assert_eq!(color.attributes_to_highlight, Some(Vec::new()));
        assert_eq!(color.attributes_to_snippet, Some(Vec::new()));
        assert_eq!(color.analytics, Some(false));
    }

    #[test]
    fn test_make_queries_keeps_base_filters() {
        let base = Query::new("").with_filters("price < 100");
        let queries = faceting().make_queries(&base);
        assert_eq!(
            queries[0].filters.as_deref(),
            Some("(price < 100) AND (brand:nike) AND (color:red OR color:blue)")
        );

        let only_color = DisjunctiveFaceting::new(Refinements::new(), ["color"])
            .with_refinement("color", "red");
        let queries = only_color.make_queries(&base);
        assert_eq!(queries[1].filters.as_deref(), Some("price < 100"));
    }

    #[test]
    fn test_make_queries_without_refinements() {
        let f = DisjunctiveFaceting::new(Refinements::new(), ["color", "brand"]);
        let queries = f.make_queries(&Query::new("q"));

        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|q| q.filters.is_none()));
        assert_eq!(queries[1].facets, Some(vec!["brand".to_string()]));
        assert_eq!(queries[2].facets, Some(vec!["color".to_string()]));
    }

    #[test]
    fn test_merge_empty_fails() {
        let err = faceting().merge_responses(Vec::new()).unwrap_err();
        assert!(matches!(err, TransportError::EmptyResponses));
    }

    #[test]
    fn test_merge_rejects_missing_facet_responses() {
        let f = DisjunctiveFaceting::new(Refinements::new(), ["color", "size"])
            .with_refinement("color", "red")
            .with_refinement("color", "blue");

        let err = f.merge_responses(vec![SearchResponse::default()]).unwrap_err();
        assert!(matches!(
            err,
            TransportError::ResponseCountMismatch { expected: 3, received: 1 }
        ));

        let err = f
            .merge_responses(vec![SearchResponse::default(), SearchResponse::default()])
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ResponseCountMismatch { expected: 3, received: 2 }
        ));
    }

    #[test]
    fn test_merge_rejects_extra_responses() {
        let err = faceting()
            .merge_responses(vec![SearchResponse::default(); 3])
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::ResponseCountMismatch { expected: 2, received: 3 }
        ));
    }

    #[test]
    fn test_merge_zero_fills_refined_values() {
        let global = SearchResponse {
            hits: vec![serde_json::json!({"objectID": "1"})],
            nb_hits: Some(1),
            ..facet_response("color", &[("red", 1)], Some(true))
        };
        let color = facet_response("color", &[("red", 5)], Some(true));

        let merged = faceting().merge_responses(vec![global, color]).unwrap();

        assert_eq!(merged.nb_hits, Some(1));
        assert_eq!(merged.hits.len(), 1);
        let counts = &merged.facets.as_ref().unwrap()["color"];
        assert_eq!(counts["red"], 5);
        assert_eq!(counts["blue"], 0);
        assert_eq!(merged.disjunctive_facets.unwrap()["color"], *counts);
        assert_eq!(merged.exhaustive_facets_count, Some(true));
    }

    #[test]
    fn test_merge_fills_facet_missing_from_response() {
        let merged = faceting()
            .merge_responses(vec![SearchResponse::default(), SearchResponse::default()])
            .unwrap();

        let counts = &merged.facets.unwrap()["color"];
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn test_merge_keeps_conjunctive_facets_from_global() {
        let global = facet_response("brand", &[("nike", 3)], None);
        let color = facet_response("color", &[("red", 2)], None);

        let merged = faceting().merge_responses(vec![global, color]).unwrap();
        let facets = merged.facets.unwrap();
        assert_eq!(facets["brand"]["nike"], 3);
        assert_eq!(facets["color"]["red"], 2);
        assert!(!merged.disjunctive_facets.unwrap().contains_key("brand"));
    }

    #[test]
    fn test_exhaustiveness_is_anded() {
        let global = facet_response("color", &[], Some(true));
        let color = facet_response("color", &[("red", 1)], Some(false));

        let merged = faceting().merge_responses(vec![global, color]).unwrap();
        assert_eq!(merged.exhaustive_facets_count, Some(false));
    }

    #[test]
    fn test_exhaustiveness_defaults_to_true() {
        let merged = faceting()
            .merge_responses(vec![SearchResponse::default(), SearchResponse::default()])
            .unwrap();
        assert_eq!(merged.exhaustive_facets_count, Some(true));
    }

    #[test]
    fn test_facet_stats_later_wins() {
        use crate::models::FacetStats;

        let stats = |max| FacetStats { min: 0.0, max, avg: None, sum: None };
        let global = SearchResponse {
            facets_stats: Some(BTreeMap::from([
                ("price".to_string(), stats(10.0)),
                ("rating".to_string(), stats(5.0)),
            ])),
            ..SearchResponse::default()
        };
        let color = SearchResponse {
            facets_stats: Some(BTreeMap::from([("price".to_string(), stats(99.0))])),
            ..SearchResponse::default()
        };

        let merged = faceting().merge_responses(vec![global, color]).unwrap();
        let merged_stats = merged.facets_stats.unwrap();
        assert_eq!(merged_stats["price"].max, 99.0);
        assert_eq!(merged_stats["rating"].max, 5.0);
    }

    proptest! {
        #[test]
        fn prop_filters_ignore_insertion_order(
            values in proptest::collection::btree_map(
                "[a-z]{1,6}",
                proptest::collection::vec("[a-z0-9]{1,6}", 0..4),
                0..5,
            )
        ) {
            let refine = |f: DisjunctiveFaceting, (attribute, vals): (&String, &Vec<String>)| {
                vals.iter()
                    .fold(f, |f, v| f.with_refinement(attribute.clone(), v.clone()))
            };
            let start =
                DisjunctiveFaceting::new(Refinements::new(), values.keys().take(1).cloned());
            let forward = values.iter().fold(start.clone(), refine);
            let reverse = values.iter().rev().fold(start, refine);

            prop_assert_eq!(forward.build_filters(None), reverse.build_filters(None));
            for attribute in values.keys() {
                let excluded = forward.build_filters(Some(attribute));
                let needle = format!("({attribute}:");
                prop_assert!(!excluded.contains(&needle));
            }
        }
    }
}
