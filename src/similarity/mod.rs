// Document similarity with word vectors.

pub mod doc_sim;
pub mod preprocess;
pub mod table;
pub mod vectors;
