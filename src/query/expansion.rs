//! Synonym and acronym expansion backed by an in-memory document corpus.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::scoring::{is_generic, tokenize};

/// Corpus variants are only proposed for query words at least this long.
const MIN_VARIANT_STEM: usize = 4;
const MAX_VARIANTS_PER_TERM: usize = 3;

const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
   ("document", &["file", "record", "paper"]),
   ("documents", &["files", "records", "papers"]),
   ("file", &["document"]),
   ("files", &["documents"]),
   ("image", &["picture", "photo", "scan"]),
   ("picture", &["image", "photo"]),
   ("contract", &["agreement"]),
   ("invoice", &["bill", "receipt"]),
   ("report", &["summary", "analysis"]),
   ("policy", &["guideline", "procedure"]),
   ("meeting", &["minutes"]),
   ("مستند", &["ملف", "وثيقة"]),
   ("ملف", &["مستند"]),
   ("عقد", &["اتفاقية"]),
   ("فاتورة", &["إيصال"]),
   ("تقرير", &["ملخص"]),
];

const BUILTIN_ACRONYMS: &[(&str, &[&str])] = &[
   ("hr", &["human resources"]),
   ("ai", &["artificial intelligence"]),
   ("ocr", &["optical character recognition"]),
   ("kpi", &["key performance indicator"]),
   ("sop", &["standard operating procedure"]),
   ("nda", &["non-disclosure agreement"]),
   ("pm", &["project management", "project manager"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusDocument {
   pub id:       String,
   #[serde(default)]
   pub title:    String,
   #[serde(default)]
   pub content:  String,
   #[serde(default)]
   pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedQuery {
   pub original_query: String,
   pub expanded_terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
   pub document_count:   usize,
   pub vocabulary_size:  usize,
   pub synonym_mappings: usize,
   pub acronym_mappings: usize,
   pub top_terms:        Vec<(String, usize)>,
}

#[derive(Debug, Clone)]
pub struct QueryExpander {
   documents:  BTreeMap<String, CorpusDocument>,
   /// term -> number of corpus documents containing it
   vocabulary: HashMap<String, usize>,
   synonyms:   HashMap<String, Vec<String>>,
   acronyms:   HashMap<String, Vec<String>>,
}

impl Default for QueryExpander {
   fn default() -> Self {
      Self::new()
   }
}

fn builtin(defs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
   defs
      .iter()
      .map(|(term, values)| ((*term).to_string(), values.iter().map(|v| (*v).to_string()).collect()))
      .collect()
}

fn merge_unique(target: &mut Vec<String>, values: impl IntoIterator<Item = String>) {
   for value in values {
      if !target.contains(&value) {
         target.push(value);
      }
   }
}

impl QueryExpander {
   pub fn new() -> Self {
      Self {
         documents:  BTreeMap::new(),
         vocabulary: HashMap::new(),
         synonyms:   builtin(BUILTIN_SYNONYMS),
         acronyms:   builtin(BUILTIN_ACRONYMS),
      }
   }

   /// Inserts or replaces documents by id and rebuilds the vocabulary.
   pub fn update_corpus(&mut self, docs: impl IntoIterator<Item = CorpusDocument>) {
      for doc in docs {
         self.documents.insert(doc.id.clone(), doc);
      }
      self.rebuild_vocabulary();
   }

   fn rebuild_vocabulary(&mut self) {
      self.vocabulary.clear();
      for doc in self.documents.values() {
         let text = format!("{} {} {}", doc.title, doc.content, doc.keywords.join(" ")).to_lowercase();
         let mut seen: Vec<&str> = tokenize(&text).filter(|w| !is_generic(w)).collect();
         seen.sort_unstable();
         seen.dedup();
         for term in seen {
            *self.vocabulary.entry(term.to_string()).or_default() += 1;
         }
      }
   }

   pub fn add_synonyms(&mut self, term: &str, synonyms: &[String]) {
      let entry = self.synonyms.entry(term.trim().to_lowercase()).or_default();
      merge_unique(entry, synonyms.iter().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()));
   }

   pub fn add_acronym(&mut self, acronym: &str, expansions: &[String]) {
      let entry = self.acronyms.entry(acronym.trim().to_lowercase()).or_default();
      merge_unique(entry, expansions.iter().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()));
   }

   /// Corpus terms sharing a stem with `term`, most frequent first.
   fn corpus_variants(&self, term: &str) -> Vec<String> {
      if term.chars().count() < MIN_VARIANT_STEM {
         return Vec::new();
      }

      let mut variants: Vec<(&String, usize)> = self
         .vocabulary
         .iter()
         .filter(|(candidate, _)| candidate.as_str() != term && candidate.starts_with(term))
         .map(|(candidate, df)| (candidate, *df))
         .collect();
      variants.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
      variants
         .into_iter()
         .take(MAX_VARIANTS_PER_TERM)
         .map(|(candidate, _)| candidate.clone())
         .collect()
   }

   pub fn expand(&self, query: &str) -> ExpandedQuery {
      let lowered = query.to_lowercase();
      let mut terms = Vec::new();

      for token in tokenize(&lowered).filter(|w| !is_generic(w)) {
         merge_unique(&mut terms, [token.to_string()]);
         if let Some(synonyms) = self.synonyms.get(token) {
            merge_unique(&mut terms, synonyms.iter().cloned());
         }
         if let Some(expansions) = self.acronyms.get(token) {
            merge_unique(&mut terms, expansions.iter().cloned());
         }
         merge_unique(&mut terms, self.corpus_variants(token));
      }

      ExpandedQuery { original_query: query.to_string(), expanded_terms: terms }
   }

   pub fn stats(&self) -> CorpusStats {
      let mut top_terms: Vec<(String, usize)> =
         self.vocabulary.iter().map(|(t, df)| (t.clone(), *df)).collect();
      top_terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
      top_terms.truncate(10);

      CorpusStats {
         document_count: self.documents.len(),
         vocabulary_size: self.vocabulary.len(),
         synonym_mappings: self.synonyms.len(),
         acronym_mappings: self.acronyms.len(),
         top_terms,
      }
   }
}
