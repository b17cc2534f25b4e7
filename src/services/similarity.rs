//! Similarity and lexical-match abstractions.
//!
//! The backing store's vector/text operators are deliberately not relied on:
//! similarity is cosine over fixed-dimension vectors computed here, and
//! lexical matching is a plain substring check over a small field set, so
//! both are mockable independent of any storage engine.

/// Cosine similarity over fixed-dimension embedding vectors, computed as
/// `1 - cosine_distance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityIndex;

impl SimilarityIndex {
    /// Cosine similarity of two vectors. Returns 0.0 on dimension mismatch
    /// or zero-norm input rather than failing: a missing or degenerate
    /// embedding simply contributes no similarity signal.
    pub fn cosine(&self, a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (x, y) in a.iter().zip(b.iter()) {
            dot += f64::from(*x) * f64::from(*y);
            norm_a += f64::from(*x) * f64::from(*x);
            norm_b += f64::from(*y) * f64::from(*y);
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    /// Maximum cosine similarity across all (query, candidate) pairs.
    /// Zero when either side is empty.
    pub fn max_similarity<'a, Q, C>(&self, queries: Q, candidates: C) -> f64
    where
        Q: IntoIterator<Item = &'a [f32]>,
        C: IntoIterator<Item = &'a [f32]> + Clone,
    {
        let mut best = 0.0f64;
        for q in queries {
            for c in candidates.clone() {
                let sim = self.cosine(q, c);
                if sim > best {
                    best = sim;
                }
            }
        }
        best
    }
}

/// Case-insensitive substring matcher over a small set of text fields.
#[derive(Debug, Clone)]
pub struct LexicalMatcher {
    terms: Vec<String>,
}

impl LexicalMatcher {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// True if any term substring-matches any of the given fields.
    pub fn matches_any<'a, I>(&self, fields: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        if self.terms.is_empty() {
            return false;
        }
        for field in fields {
            let haystack = field.to_lowercase();
            if self.terms.iter().any(|t| haystack.contains(t)) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_one() {
        let index = SimilarityIndex;
        let v = vec![0.5f32, 0.5, 0.5];
        let sim = index.cosine(&v, &v);
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_zero() {
        let index = SimilarityIndex;
        assert!(index.cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }

    #[test]
    fn cosine_dimension_mismatch_is_zero() {
        let index = SimilarityIndex;
        assert_eq!(index.cosine(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn max_similarity_over_pairs() {
        let index = SimilarityIndex;
        let q1 = vec![1.0f32, 0.0];
        let q2 = vec![0.0f32, 1.0];
        let c1 = vec![0.0f32, 1.0];
        let queries: Vec<&[f32]> = vec![&q1, &q2];
        let candidates: Vec<&[f32]> = vec![&c1];
        let best = index.max_similarity(queries, candidates);
        assert!((best - 1.0).abs() < 1e-9);
    }

    #[test]
    fn matcher_is_case_insensitive() {
        let matcher = LexicalMatcher::new(["HealthCare"]);
        assert!(matcher.matches_any(["An act relating to healthcare access"]));
        assert!(!matcher.matches_any(["An act relating to transportation"]));
    }

    #[test]
    fn empty_terms_never_match() {
        let matcher = LexicalMatcher::new(Vec::<String>::new());
        assert!(!matcher.matches_any(["anything"]));
    }
}
