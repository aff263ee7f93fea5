use serde::{Deserialize, Serialize};

/// A scored snippet. Serializes with the `chunk` / `source` / `score` keys prompt builders cite from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Full chunk text, provenance header included.
    #[serde(rename = "chunk")]
    pub chunk_text: String,
    #[serde(rename = "source")]
    pub source_label: String,
    /// Cosine similarity in [0, 1].
    pub score: f32,
}

/// Anything that can be turned into a free-text retrieval query.
///
/// Callers holding structured context (payment status, objections, channel, ...)
/// implement this; the index only ever sees the resulting string.
pub trait RetrievalQuery {
    fn to_retrieval_query(&self) -> String;
}

impl RetrievalQuery for str {
    fn to_retrieval_query(&self) -> String { self.to_string() }
}

impl RetrievalQuery for String {
    fn to_retrieval_query(&self) -> String { self.clone() }
}

impl<T: RetrievalQuery + ?Sized> RetrievalQuery for &T {
    fn to_retrieval_query(&self) -> String { (**self).to_retrieval_query() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_citation_keys() {
        let r = QueryResult { chunk_text: "Source: [Doc1] (Doc1_a.md)\nbody".into(), source_label: "[Doc1]".into(), score: 0.5 };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["source"], "[Doc1]");
        assert_eq!(v["score"], 0.5);
        assert!(v["chunk"].as_str().unwrap().starts_with("Source: [Doc1]"));
    }
}
