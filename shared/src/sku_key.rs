//! Canonical SKU key
//!
//! An SKU is identified inside its product by the set of attribute values it
//! carries. The canonical key turns that unordered set into one string:
//!
//! ```text
//! {(7, 31), (2, 15)}  →  "2:15|7:31"
//! ```
//!
//! Pairs are ordered by attribute id (an SKU holds at most one value per
//! attribute), rendered as `attribute_id:value_id` and joined with `|`. Ids are
//! integers, so neither separator can occur inside a rendered id and two
//! different pair sets never produce the same key. The empty set encodes to
//! the empty string.

use serde::{Deserialize, Serialize};

/// One (attribute, value) choice of an SKU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeValuePair {
    pub attribute_id: i64,
    pub value_id: i64,
}

impl AttributeValuePair {
    pub fn new(attribute_id: i64, value_id: i64) -> Self {
        Self {
            attribute_id,
            value_id,
        }
    }
}

impl std::fmt::Display for AttributeValuePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.attribute_id, self.value_id)
    }
}

/// Encode an unordered pair set into its canonical key.
///
/// Input order is irrelevant and repeated identical pairs count once.
pub fn encode_canonical_key(pairs: &[AttributeValuePair]) -> String {
    let mut sorted = pairs.to_vec();
    // Value id as secondary key keeps the output total even for malformed
    // input carrying two values of one attribute.
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pair(a: i64, v: i64) -> AttributeValuePair {
        AttributeValuePair::new(a, v)
    }

    fn permutations(items: &[AttributeValuePair]) -> Vec<Vec<AttributeValuePair>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_encode_format() {
        assert_eq!(encode_canonical_key(&[pair(7, 31), pair(2, 15)]), "2:15|7:31");
        assert_eq!(encode_canonical_key(&[pair(4, 9)]), "4:9");
    }

    #[test]
    fn test_empty_set_encodes_to_empty_string() {
        assert_eq!(encode_canonical_key(&[]), "");
    }

    #[test]
    fn test_every_permutation_encodes_identically() {
        let set = [pair(10, 3), pair(2, 41), pair(7, 7), pair(1, 100)];
        let expected = "1:100|2:41|7:7|10:3";
        let perms = permutations(&set);
        assert_eq!(perms.len(), 24);
        for p in perms {
            assert_eq!(encode_canonical_key(&p), expected);
        }
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        // "10" < "9" as text; attribute ids must compare as numbers
        assert_eq!(encode_canonical_key(&[pair(10, 1), pair(9, 2)]), "9:2|10:1");
    }

    #[test]
    fn test_repeated_pair_counts_once() {
        assert_eq!(
            encode_canonical_key(&[pair(3, 5), pair(3, 5), pair(1, 2)]),
            encode_canonical_key(&[pair(1, 2), pair(3, 5)])
        );
    }

    #[test]
    fn test_distinct_combinations_never_collide() {
        // Universe chosen so digit concatenations line up: 1/11/111 etc.
        let attributes = [1_i64, 11, 111];
        let values = [1_i64, 11, 12, 111, 121];

        // Every combination choosing at most one value per attribute
        let mut combos: Vec<Vec<AttributeValuePair>> = vec![vec![]];
        for &a in &attributes {
            let mut next = Vec::new();
            for combo in &combos {
                next.push(combo.clone());
                for &v in &values {
                    let mut c = combo.clone();
                    c.push(pair(a, v));
                    next.push(c);
                }
            }
            combos = next;
        }
        assert_eq!(combos.len(), 6 * 6 * 6);

        let mut seen: HashMap<String, Vec<AttributeValuePair>> = HashMap::new();
        for combo in combos {
            let key = encode_canonical_key(&combo);
            let mut sorted = combo.clone();
            sorted.sort();
            if let Some(previous) = seen.insert(key.clone(), sorted.clone()) {
                panic!("key {key} produced by {previous:?} and {sorted:?}");
            }
        }
    }

    #[test]
    fn test_pair_serde_shape() {
        let json = serde_json::to_value(pair(2, 15)).unwrap();
        assert_eq!(json, serde_json::json!({"attribute_id": 2, "value_id": 15}));
    }
}
