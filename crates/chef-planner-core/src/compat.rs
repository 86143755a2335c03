use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Match strength used for pairs with no recorded edge.
pub const NEUTRAL_MATCH: u8 = 1;

/// Pair value at or above which an edge counts towards a triangle.
pub const STRONG_MATCH: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEdge {
    pub a: String,
    pub b: String,
    pub value: u8,
}

impl MatchEdge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, value: u8) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            value,
        }
    }
}

/// Symmetric, read-only adjacency over ingredient match edges.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityIndex {
    partners: HashMap<String, Vec<(String, u8)>>,
    pairs: HashMap<(String, String), u8>,
}

impl CompatibilityIndex {
    /// Builds both directions of every edge. Edges with an empty endpoint or a
    /// self-loop are skipped; when a pair repeats, the last value wins.
    pub fn build<'a>(edges: impl IntoIterator<Item = &'a MatchEdge>) -> Self {
        let mut pairs: HashMap<(String, String), u8> = HashMap::new();
        for edge in edges {
            if edge.a.is_empty() || edge.b.is_empty() || edge.a == edge.b {
                continue;
            }
            pairs.insert(pair_key(&edge.a, &edge.b), edge.value);
        }

        let mut partners: HashMap<String, Vec<(String, u8)>> = HashMap::new();
        for ((a, b), value) in &pairs {
            partners
                .entry(a.clone())
                .or_default()
                .push((b.clone(), *value));
            partners
                .entry(b.clone())
                .or_default()
                .push((a.clone(), *value));
        }
        for list in partners.values_mut() {
            list.sort_by(|(name_a, value_a), (name_b, value_b)| {
                value_b
                    .cmp(value_a)
                    .then_with(|| name_a.to_lowercase().cmp(&name_b.to_lowercase()))
                    .then_with(|| name_a.cmp(name_b))
            });
        }

        Self { partners, pairs }
    }

    /// Partners of `name`, strongest first, then by name.
    pub fn lookup(&self, name: &str) -> &[(String, u8)] {
        self.partners.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn top_partners(&self, name: &str, limit: usize) -> &[(String, u8)] {
        let all = self.lookup(name);
        all.get(..limit.min(all.len())).unwrap_or(all)
    }

    /// Recorded edge value, if any.
    pub fn edge(&self, a: &str, b: &str) -> Option<u8> {
        self.pairs.get(&pair_key(a, b)).copied()
    }

    /// Edge value, neutral when the pair was never recorded.
    pub fn pair_value(&self, a: &str, b: &str) -> u8 {
        self.edge(a, b).unwrap_or(NEUTRAL_MATCH)
    }

    pub fn edge_count(&self) -> usize {
        self.pairs.len()
    }

    /// Mean pair value over every unordered pair of `names`; 1.0 below two names.
    pub fn average_match(&self, names: &[String]) -> f64 {
        let mut total = 0.0;
        let mut pairs = 0_u32;
        for (i, a) in names.iter().enumerate() {
            for b in names.iter().skip(i + 1) {
                total += f64::from(self.pair_value(a, b));
                pairs += 1;
            }
        }
        if pairs == 0 {
            return f64::from(NEUTRAL_MATCH);
        }
        round2(total / f64::from(pairs))
    }

    /// Number of 3-subsets of `names` whose three pairs are all recorded as strong.
    pub fn count_triangles(&self, names: &[String]) -> usize {
        let strong = |a: &str, b: &str| self.edge(a, b).is_some_and(|v| v >= STRONG_MATCH);
        let mut triangles = 0;
        for (i, a) in names.iter().enumerate() {
            for (j, b) in names.iter().enumerate().skip(i + 1) {
                if !strong(a, b) {
                    continue;
                }
                triangles += names
                    .iter()
                    .skip(j + 1)
                    .filter(|c| strong(a, c) && strong(b, c))
                    .count();
            }
        }
        triangles
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
