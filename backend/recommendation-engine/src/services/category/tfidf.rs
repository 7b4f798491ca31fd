// ============================================
// TF-IDF Vectorizer
// ============================================
//
// Turns category text into L2-normalized term weight vectors.
//
//   tf(t, d)  = raw count of term t in document d
//   idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//   w(t, d)   = tf(t, d) * idf(t), then the row is scaled to unit length
//
// Tokens are runs of alphanumeric/underscore characters, lower-cased, at least
// two characters long. Vocabulary columns are assigned in sorted term order.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let tokenized: Vec<BTreeSet<String>> = documents
            .iter()
            .map(|doc| tokenize(doc.as_ref()).collect())
            .collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for terms in &tokenized {
            for term in terms {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (column, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, column);
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Embed one document; terms outside the vocabulary are ignored.
    pub fn transform(&self, document: &str) -> Array1<f64> {
        let mut row = Array1::<f64>::zeros(self.vocabulary.len());
        for term in tokenize(document) {
            if let Some(&column) = self.vocabulary.get(&term) {
                row[column] += self.idf[column];
            }
        }

        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
        row
    }

    pub fn transform_many<S: AsRef<str>>(&self, documents: &[S]) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((documents.len(), self.vocabulary.len()));
        for (i, doc) in documents.iter().enumerate() {
            matrix.row_mut(i).assign(&self.transform(doc.as_ref()));
        }
        matrix
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(|token| token.to_lowercase())
}
