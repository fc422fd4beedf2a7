//! Co-purchase aggregation over purchase histories.
//!
//! Scans every purchase record containing a source product and counts, per
//! other product, how many customers bought both. The aggregate feeds the
//! pattern document builder, whose output is embedded into the pattern index.

use std::collections::{HashMap, HashSet};

use crate::models::{Product, PurchaseRecord};

/// Count, for every other product, how many customers bought it together
/// with `source_id`.
///
/// Each record is treated as a set: a product appearing twice in one user's
/// history counts once per co-occurring pair. The result is sorted descending
/// by count; ties keep the order in which the other product first appeared
/// across the scanned records, never map iteration order. A product nobody
/// co-purchased anything with yields an empty vec.
pub fn co_purchase_counts(source_id: &str, records: &[PurchaseRecord]) -> Vec<(String, u32)> {
    let mut first_seen: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for record in records {
        if !record.product_ids.iter().any(|id| id == source_id) {
            continue;
        }

        let mut seen_in_record: HashSet<&str> = HashSet::new();
        for other_id in &record.product_ids {
            if other_id == source_id || !seen_in_record.insert(other_id.as_str()) {
                continue;
            }
            match counts.get_mut(other_id.as_str()) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(other_id.clone(), 1);
                    first_seen.push(other_id.clone());
                }
            }
        }
    }

    let mut aggregate: Vec<(String, u32)> = first_seen
        .into_iter()
        .map(|id| {
            let count = counts[&id];
            (id, count)
        })
        .collect();

    // Stable sort: ties retain first-appearance order
    aggregate.sort_by(|a, b| b.1.cmp(&a.1));
    aggregate
}

/// Render a co-purchase aggregate as a natural-language document.
///
/// One intro sentence naming the source product, then one line per
/// co-purchased product in aggregate order. Ids that no longer resolve in
/// the catalog are skipped; the purchase history may reference products
/// removed from the catalog.
pub fn build_pattern_document(
    source: &Product,
    aggregate: &[(String, u32)],
    catalog: &HashMap<String, Product>,
) -> String {
    let mut lines = vec![format!(
        "Users who bought '{}' ({}) also frequently purchased the following products:",
        source.name, source.category
    )];

    for (other_id, count) in aggregate {
        let Some(product) = catalog.get(other_id) else {
            continue;
        };
        lines.push(format!(
            "  - {} (Category: {}, Price: ${:.2}) - bought together {} time(s). {}",
            product.name, product.category, product.price, count, product.description
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: &str, product_ids: &[&str]) -> PurchaseRecord {
        PurchaseRecord {
            user_id: user_id.to_string(),
            username: user_id.to_string(),
            product_ids: product_ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Fitness".to_string(),
            description: format!("Description of {}.", name),
            price: 25.0,
            tags: vec![],
        }
    }

    #[test]
    fn test_pairwise_counts() {
        // A bought by users 1, 2, 3; B bought by users 1, 2
        let records = vec![
            record("U1", &["A", "B"]),
            record("U2", &["A", "B"]),
            record("U3", &["A"]),
        ];

        assert_eq!(
            co_purchase_counts("A", &records),
            vec![("B".to_string(), 2)]
        );
        assert_eq!(
            co_purchase_counts("B", &records),
            vec![("A".to_string(), 2)]
        );
    }

    #[test]
    fn test_source_never_in_own_aggregate() {
        let records = vec![record("U1", &["A", "B", "C"]), record("U2", &["A", "C"])];
        let aggregate = co_purchase_counts("A", &records);
        assert!(aggregate.iter().all(|(id, _)| id != "A"));
    }

    #[test]
    fn test_no_co_occurrences_is_empty() {
        let records = vec![record("U1", &["A"]), record("U2", &["B", "C"])];
        assert!(co_purchase_counts("A", &records).is_empty());
        assert!(co_purchase_counts("Z", &records).is_empty());
    }

    #[test]
    fn test_duplicates_within_record_count_once() {
        let records = vec![record("U1", &["A", "B", "B", "A"])];
        assert_eq!(
            co_purchase_counts("A", &records),
            vec![("B".to_string(), 1)]
        );
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        // C co-occurs twice; B and D once each, B first seen before D
        let records = vec![
            record("U1", &["A", "B", "C"]),
            record("U2", &["A", "C", "D"]),
        ];
        assert_eq!(
            co_purchase_counts("A", &records),
            vec![
                ("C".to_string(), 2),
                ("B".to_string(), 1),
                ("D".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_pattern_document_layout() {
        let source = product("A", "Kettlebell");
        let catalog: HashMap<String, Product> = [
            ("A".to_string(), product("A", "Kettlebell")),
            ("B".to_string(), product("B", "Yoga Mat")),
        ]
        .into();

        let doc = build_pattern_document(&source, &[("B".to_string(), 3)], &catalog);
        assert!(doc.starts_with(
            "Users who bought 'Kettlebell' (Fitness) also frequently purchased"
        ));
        assert!(doc.contains("Yoga Mat"));
        assert!(doc.contains("bought together 3 time(s)"));
        assert!(doc.contains("$25.00"));
    }

    #[test]
    fn test_pattern_document_skips_dangling_ids() {
        let source = product("A", "Kettlebell");
        let catalog: HashMap<String, Product> =
            [("B".to_string(), product("B", "Yoga Mat"))].into();

        // "GONE" is not in the catalog anymore; the document must not fail
        let doc = build_pattern_document(
            &source,
            &[("GONE".to_string(), 5), ("B".to_string(), 1)],
            &catalog,
        );
        assert!(!doc.contains("GONE"));
        assert!(doc.contains("Yoga Mat"));
        assert_eq!(doc.lines().count(), 2);
    }
}
