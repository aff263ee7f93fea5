use crate::config::{RetrievalConfig, DEFAULT_MIN_SCORE};
use crate::corpus::{Chunk, Corpus, CorpusLoader};
use crate::error::{Error, Result};
use crate::query::{QueryResult, RetrievalQuery};
use crate::tokenizer::Tokenizer;
use crate::TermId;
use std::collections::HashMap;

/// Frozen term dictionary with per-term document frequency and IDF.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.dictionary.is_empty() }

    /// IDF of `term`, or `None` when the corpus never contained it.
    pub fn idf_of(&self, term: &str) -> Option<f32> {
        self.dictionary.get(term).map(|&tid| self.idf[tid as usize])
    }
}

/// L2-normalized tf-idf weights of one chunk, sorted by term id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentVector {
    pub weights: Vec<(TermId, f32)>,
}

impl DocumentVector {
    fn dot(&self, query: &HashMap<TermId, f32>) -> f32 {
        self.weights.iter().filter_map(|(tid, w)| query.get(tid).map(|q| q * w)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexOptions {
    pub tokenizer: Tokenizer,
    /// Results must score strictly above this.
    pub min_score: f32,
}

impl Default for IndexOptions {
    fn default() -> Self { Self { tokenizer: Tokenizer::default(), min_score: DEFAULT_MIN_SCORE } }
}

impl IndexOptions {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self { tokenizer: Tokenizer::new(config.stem), min_score: config.min_score }
    }
}

/// Built index. `chunks[i]` and `vectors[i]` always describe the same chunk.
#[derive(Debug, Clone)]
pub struct ReadyIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<DocumentVector>,
    vocabulary: Vocabulary,
    options: IndexOptions,
}

/// Immutable retrieval index over a chunked corpus.
///
/// `Empty` answers every query with no results; `Ready` holds the vocabulary and
/// one document vector per chunk. Neither state changes after construction, so a
/// shared reference can serve queries from any number of threads.
#[derive(Debug, Clone)]
pub enum VectorIndex {
    Empty,
    Ready(ReadyIndex),
}

impl VectorIndex {
    /// Loads `config.docs_dir` and indexes it.
    pub fn open(config: &RetrievalConfig) -> Result<Self> {
        let corpus = CorpusLoader::from_config(config).load(&config.docs_dir)?;
        Ok(Self::from_corpus(corpus, IndexOptions::from_config(config)))
    }

    pub fn from_corpus(corpus: Corpus, options: IndexOptions) -> Self {
        Self::build(corpus.chunks, options)
    }

    pub fn build(chunks: Vec<Chunk>, options: IndexOptions) -> Self {
        if chunks.is_empty() {
            tracing::warn!("no documents indexed");
            return VectorIndex::Empty;
        }

        let mut dictionary: HashMap<String, TermId> = HashMap::new();
        let mut df: Vec<u32> = Vec::new();
        let mut counts: Vec<HashMap<TermId, u32>> = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let mut tf: HashMap<TermId, u32> = HashMap::new();
            for (term, _pos) in options.tokenizer.tokenize(&chunk.text) {
                let next = dictionary.len() as TermId;
                let tid = *dictionary.entry(term).or_insert(next);
                if tid == next { df.push(0); }
                let c = tf.entry(tid).or_insert(0);
                if *c == 0 { df[tid as usize] += 1; }
                *c += 1;
            }
            counts.push(tf);
        }

        // Smoothed idf: a term in every chunk gets 1.0, rarer terms more.
        let n = chunks.len() as f32;
        let idf: Vec<f32> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f32)).ln() + 1.0).collect();

        let vectors: Vec<DocumentVector> = counts
            .into_iter()
            .map(|tf| {
                let mut weights: Vec<(TermId, f32)> = tf.into_iter().map(|(tid, c)| (tid, c as f32 * idf[tid as usize])).collect();
                normalize(weights.iter_mut().map(|(_, w)| w));
                weights.sort_by_key(|(tid, _)| *tid);
                DocumentVector { weights }
            })
            .collect();

        tracing::info!(num_chunks = chunks.len(), num_terms = dictionary.len(), "built tf-idf index");
        VectorIndex::Ready(ReadyIndex { chunks, vectors, vocabulary: Vocabulary { dictionary, df, idf }, options })
    }

    pub fn len(&self) -> usize {
        match self {
            VectorIndex::Empty => 0,
            VectorIndex::Ready(r) => r.chunks.len(),
        }
    }

    pub fn is_empty(&self) -> bool { matches!(self, VectorIndex::Empty) }

    pub fn chunks(&self) -> &[Chunk] {
        match self {
            VectorIndex::Empty => &[],
            VectorIndex::Ready(r) => &r.chunks,
        }
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        match self {
            VectorIndex::Empty => None,
            VectorIndex::Ready(r) => Some(&r.vocabulary),
        }
    }

    /// Top `k` chunks by cosine similarity, keeping only those scoring above the
    /// relevance threshold. Fewer than `k` results (or none) is a normal outcome.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<QueryResult>> {
        if k == 0 { return Err(Error::InvalidK(k)); }
        let results = match self {
            VectorIndex::Empty => Vec::new(),
            VectorIndex::Ready(ready) => ready.retrieve(query, k),
        };
        tracing::debug!(k, hits = results.len(), "retrieve");
        Ok(results)
    }

    pub fn retrieve_for<Q: RetrievalQuery + ?Sized>(&self, source: &Q, k: usize) -> Result<Vec<QueryResult>> {
        self.retrieve(&source.to_retrieval_query(), k)
    }
}

impl ReadyIndex {
    /// Query weights over the frozen vocabulary; unknown terms are dropped.
    fn vectorize(&self, query: &str) -> HashMap<TermId, f32> {
        let mut weights: HashMap<TermId, f32> = HashMap::new();
        for (term, _pos) in self.options.tokenizer.tokenize(query) {
            if let Some(&tid) = self.vocabulary.dictionary.get(&term) {
                *weights.entry(tid).or_insert(0.0) += 1.0;
            }
        }
        for (tid, w) in weights.iter_mut() {
            *w *= self.vocabulary.idf[*tid as usize];
        }
        normalize(weights.values_mut());
        weights
    }

    fn retrieve(&self, query: &str, k: usize) -> Vec<QueryResult> {
        // An all-unknown query scores every chunk 0.0 and goes through the same filter.
        let q = self.vectorize(query);
        let scores: Vec<f32> = self.vectors.iter().map(|v| v.dot(&q).clamp(0.0, 1.0)).collect();

        // Stable sort: equal scores keep chunk order.
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k);

        order
            .into_iter()
            .filter(|&i| scores[i] > self.options.min_score)
            .map(|i| QueryResult {
                chunk_text: self.chunks[i].text.clone(),
                source_label: self.chunks[i].source_label.clone(),
                score: scores[i],
            })
            .collect()
    }
}

fn normalize<'a>(weights: impl Iterator<Item = &'a mut f32>) {
    let weights: Vec<&mut f32> = weights.collect();
    let norm = weights.iter().map(|w| **w * **w).sum::<f32>().sqrt();
    if norm == 0.0 { return; }
    for w in weights { *w /= norm; }
}
