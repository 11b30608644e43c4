// Keyed word vectors in word2vec format.
//
// Both layouts start with an ASCII header line "<count> <dim>". The text
// layout follows with one "<word> <v1> ... <vdim>" line per word; the binary
// layout follows with "<word> " and dim little-endian f32 values per word.
// The layout is detected from the content, not the file name.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{HandlerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct KeyedVectors {
    index: HashMap<String, usize>,
    /// Row-major, `dim` values per word.
    vectors: Vec<f32>,
    dim: usize,
}

impl KeyedVectors {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let vectors = Self::from_bytes(&bytes)
            .map_err(|reason| HandlerError::invalid_artifact(path, reason))?;
        debug!(
            path = %path.display(),
            words = vectors.len(),
            dim = vectors.dim(),
            "Loaded word vectors"
        );
        Ok(vectors)
    }

    /// Parse either layout. Text is tried first when the body is valid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        let newline = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| "missing header line".to_string())?;
        let header = std::str::from_utf8(&bytes[..newline])
            .map_err(|_| "header is not UTF-8".to_string())?;
        let (count, dim) = parse_header(header)?;
        let body = &bytes[newline + 1..];

        match std::str::from_utf8(body) {
            Ok(text) => parse_text(text, count, dim)
                .or_else(|text_err| parse_binary(body, count, dim).map_err(|_| text_err)),
            Err(_) => parse_binary(body, count, dim),
        }
    }

    /// Build from in-memory `(word, vector)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut builder: Option<Builder> = None;
        for (word, vector) in pairs {
            let b = builder.get_or_insert_with(|| Builder::new(vector.len(), 0));
            b.push(word.into(), &vector)?;
        }
        Ok(builder.map(Builder::finish).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        let &i = self.index.get(word)?;
        Some(&self.vectors[i * self.dim..(i + 1) * self.dim])
    }

    /// Cosine similarity between the mean vectors of two word sets.
    ///
    /// Words missing from the vocabulary are ignored. Returns `None` when
    /// either side has no known words left.
    pub fn n_similarity<S: AsRef<str>>(&self, ws1: &[S], ws2: &[S]) -> Option<f64> {
        let a = unit(self.mean_vector(ws1)?);
        let b = unit(self.mean_vector(ws2)?);
        Some(a.iter().zip(&b).map(|(x, y)| x * y).sum())
    }

    fn mean_vector<S: AsRef<str>>(&self, words: &[S]) -> Option<Vec<f64>> {
        let mut sum = vec![0.0_f64; self.dim];
        let mut n = 0usize;
        for v in words.iter().filter_map(|w| self.get(w.as_ref())) {
            for (s, &x) in sum.iter_mut().zip(v) {
                *s += f64::from(x);
            }
            n += 1;
        }
        if n == 0 {
            return None;
        }
        sum.iter_mut().for_each(|s| *s /= n as f64);
        Some(sum)
    }
}

impl Default for KeyedVectors {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            vectors: Vec::new(),
            dim: 0,
        }
    }
}

/// Scale to unit length; the zero vector stays zero.
fn unit(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

struct Builder {
    index: HashMap<String, usize>,
    vectors: Vec<f32>,
    dim: usize,
}

impl Builder {
    fn new(dim: usize, capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            vectors: Vec::with_capacity(capacity.saturating_mul(dim)),
            dim,
        }
    }

    /// Size for the words a body can actually hold, never the header's
    /// count alone. `min_word_len` is the smallest encoding of one word.
    fn for_body(dim: usize, count: usize, body_len: usize, min_word_len: usize) -> Self {
        Self::new(dim, count.min(body_len / min_word_len.max(1)))
    }

    fn push(&mut self, word: String, vector: &[f32]) -> Result<(), String> {
        if vector.len() != self.dim {
            return Err(format!(
                "vector for {word:?} has {} values, expected {}",
                vector.len(),
                self.dim
            ));
        }
        if self.index.contains_key(&word) {
            warn!(word = %word, "Duplicate word in vector file, keeping the first");
            return Ok(());
        }
        self.index.insert(word, self.index.len());
        self.vectors.extend_from_slice(vector);
        Ok(())
    }

    fn finish(self) -> KeyedVectors {
        KeyedVectors {
            index: self.index,
            vectors: self.vectors,
            dim: self.dim,
        }
    }
}

fn parse_header(header: &str) -> Result<(usize, usize), String> {
    let mut parts = header.split_whitespace();
    let count = parts.next().and_then(|s| s.parse::<usize>().ok());
    let dim = parts.next().and_then(|s| s.parse::<usize>().ok());
    match (count, dim, parts.next()) {
        (Some(count), Some(dim), None) if dim > 0 => Ok((count, dim)),
        _ => Err(format!("malformed header {header:?}, expected \"<count> <dim>\"")),
    }
}

fn parse_text(body: &str, count: usize, dim: usize) -> Result<KeyedVectors, String> {
    // "w" plus " v" per value
    let min_word_len = dim.saturating_mul(2).saturating_add(2);
    let mut builder = Builder::for_body(dim, count, body.len(), min_word_len);
    let mut read = 0;

    for (line_no, line) in body.lines().enumerate() {
        if read == count {
            break;
        }
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            continue;
        };
        let vector = parts
            .map(|v| v.parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| format!("line {}: {e}", line_no + 2))?;
        builder.push(word.to_string(), &vector)?;
        read += 1;
    }

    if read < count {
        return Err(format!("header promises {count} words, found {read}"));
    }
    Ok(builder.finish())
}

fn parse_binary(body: &[u8], count: usize, dim: usize) -> Result<KeyedVectors, String> {
    let vector_len = dim
        .checked_mul(4)
        .filter(|&len| len <= body.len())
        .ok_or_else(|| format!("dimension {dim} does not fit in the file"))?;
    let mut builder = Builder::for_body(dim, count, body.len(), vector_len + 2);
    let mut pos = 0;
    let mut vector = vec![0.0_f32; dim];

    for n in 0..count {
        while body.get(pos) == Some(&b'\n') {
            pos += 1;
        }
        let start = pos;
        let space = body[start..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| format!("word {n}: missing separator"))?;
        let word = String::from_utf8_lossy(&body[start..start + space]).into_owned();
        pos = start + space + 1;

        let end = pos
            .checked_add(vector_len)
            .ok_or_else(|| format!("word {n} ({word:?}): vector offset overflows"))?;
        let raw = body
            .get(pos..end)
            .ok_or_else(|| format!("word {n} ({word:?}): truncated vector"))?;
        for (slot, chunk) in vector.iter_mut().zip(raw.chunks_exact(4)) {
            *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        pos = end;

        builder.push(word, &vector)?;
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "3 2\ncat 1.0 0.0\ndog 0.8 0.6\ncar 0.0 1.0\n";

    fn binary(words: &[(&str, [f32; 2])]) -> Vec<u8> {
        let mut out = format!("{} 2\n", words.len()).into_bytes();
        for (word, v) in words {
            out.extend_from_slice(word.as_bytes());
            out.push(b' ');
            for x in v {
                out.extend_from_slice(&x.to_le_bytes());
            }
            out.push(b'\n');
        }
        out
    }

    #[test]
    fn test_parse_text_format() {
        let kv = KeyedVectors::from_bytes(TEXT.as_bytes()).unwrap();
        assert_eq!(kv.len(), 3);
        assert_eq!(kv.dim(), 2);
        assert_eq!(kv.get("dog"), Some(&[0.8_f32, 0.6][..]));
        assert!(!kv.contains("bird"));
    }

    #[test]
    fn test_parse_binary_format() {
        let bytes = binary(&[("cat", [1.0, 0.0]), ("car", [0.0, -1.5])]);
        let kv = KeyedVectors::from_bytes(&bytes).unwrap();
        assert_eq!(kv.len(), 2);
        assert_eq!(kv.get("car"), Some(&[0.0_f32, -1.5][..]));
    }

    #[test]
    fn test_binary_that_happens_to_be_utf8() {
        // 0.5f32 is 00 00 00 3f, all ASCII bytes
        let bytes = binary(&[("half", [0.5, 0.5])]);
        let kv = KeyedVectors::from_bytes(&bytes).unwrap();
        assert_eq!(kv.get("half"), Some(&[0.5_f32, 0.5][..]));
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(KeyedVectors::from_bytes(b"not a header\n").is_err());
        assert!(KeyedVectors::from_bytes(b"3 2").is_err());
    }

    #[test]
    fn test_rejects_short_file() {
        assert!(KeyedVectors::from_bytes(b"2 2\ncat 1.0 0.0\n").is_err());
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        assert!(KeyedVectors::from_bytes(b"1 3\ncat 1.0 0.0\n").is_err());
    }

    #[test]
    fn test_oversized_count_is_an_error() {
        assert!(KeyedVectors::from_bytes(b"999999999999 300\ncat 1.0\n").is_err());
        assert!(KeyedVectors::from_bytes(b"18446744073709551615 2\ncat 1.0 0.0\n").is_err());
    }

    #[test]
    fn test_oversized_dimension_is_an_error() {
        assert!(KeyedVectors::from_bytes(b"1 18446744073709551615\ncat \x00\x00\x80\x3f\n").is_err());
        assert!(KeyedVectors::from_bytes(b"1 99999999999\ncat 1.0\n").is_err());
    }

    #[test]
    fn test_rejects_truncated_binary_vector() {
        let mut bytes = binary(&[("cat", [1.0, 0.0]), ("car", [0.0, -1.5])]);
        bytes.truncate(bytes.len() - 5);
        let err = KeyedVectors::from_bytes(&bytes).unwrap_err();
        assert!(err.contains("truncated"), "{err}");
    }

    #[test]
    fn test_n_similarity_identical_sets() {
        let kv = KeyedVectors::from_bytes(TEXT.as_bytes()).unwrap();
        let sim = kv.n_similarity(&["cat", "dog"], &["dog", "cat"]).unwrap();
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_n_similarity_orthogonal() {
        let kv = KeyedVectors::from_bytes(TEXT.as_bytes()).unwrap();
        let sim = kv.n_similarity(&["cat"], &["car"]).unwrap();
        assert!(sim.abs() < 1e-9);
    }

    #[test]
    fn test_n_similarity_uses_mean_vectors() {
        let kv = KeyedVectors::from_bytes(TEXT.as_bytes()).unwrap();
        // mean(cat, car) = (0.5, 0.5) -> unit (0.707, 0.707); dog = (0.8, 0.6)
        let sim = kv.n_similarity(&["cat", "car"], &["dog"]).unwrap();
        let expected = (0.8 + 0.6) / 2f64.sqrt();
        assert!((sim - expected).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn test_n_similarity_empty_side() {
        let kv = KeyedVectors::from_bytes(TEXT.as_bytes()).unwrap();
        let empty: [&str; 0] = [];
        assert!(kv.n_similarity(&empty, &["cat"]).is_none());
        assert!(kv.n_similarity(&["unknown"], &["cat"]).is_none());
    }

    #[test]
    fn test_from_pairs() {
        let kv = KeyedVectors::from_pairs([("a", vec![1.0, 2.0]), ("b", vec![3.0, 4.0])]).unwrap();
        assert_eq!(kv.dim(), 2);
        assert!(kv.contains("b"));
        assert!(KeyedVectors::from_pairs([("a", vec![1.0]), ("b", vec![1.0, 2.0])]).is_err());
    }
}
