//! Entity extraction: document types, authors, dates and topics.
//!
//! All patterns are case-insensitive and run over the case-preserved query so
//! that raw values keep the user's spelling while normalized values do not
//! depend on it.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::Regex;

use crate::types::{Entity, EntityType, Language};

fn re(pattern: &str) -> Regex {
   Regex::new(&format!("(?i){pattern}")).unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}"))
}

fn table<T: Copy>(defs: &[(&str, T)]) -> Vec<(Regex, T)> {
   defs.iter().map(|&(pattern, tag)| (re(pattern), tag)).collect()
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

const EN_DOCUMENT_TYPES: &[(&str, &str)] = &[
   (r"\bpdfs?\b", "pdf"),
   (r"\b(?:ms\s+)?word\b|\bdocx\b", "word"),
   (r"\bexcel\b|\bspreadsheets?\b|\bxlsx?\b|\bcsv\b", "excel"),
   (r"\bpowerpoint\b|\bpptx?\b|\bpresentations?\b|\bslides\b", "powerpoint"),
   (r"\bimages?\b|\bpictures?\b|\bphotos?\b|\bscans?\b|\bjpe?g\b|\bpng\b|\btiff?\b", "image"),
   (r"\btext files?\b|\btxt\b|\bplain text\b", "text"),
   (r"\be-?mails?\b", "email"),
];

const AR_DOCUMENT_TYPES: &[(&str, &str)] = &[
   (r"\bبي\s*دي\s*اف\b", "pdf"),
   (r"\bوورد\b", "word"),
   (r"\bإكسل\b|\bاكسل\b|\bجداول\s+بيانات\b|\bجدول\s+بيانات\b", "excel"),
   (r"\bباوربوينت\b|\bعروض\s+تقديمية\b|\bعرض\s+تقديمي\b", "powerpoint"),
   (r"\b(?:ال)?صور(?:ة)?\b", "image"),
   (r"\bملفات\s+نصية\b|\bملف\s+نصي\b", "text"),
   (r"\bبريد\s+إلكتروني\b|\bالبريد\s+الإلكتروني\b", "email"),
];

static EN_DOCUMENT_TABLE: LazyLock<Vec<(Regex, &str)>> = LazyLock::new(|| table(EN_DOCUMENT_TYPES));
static AR_DOCUMENT_TABLE: LazyLock<Vec<(Regex, &str)>> = LazyLock::new(|| table(AR_DOCUMENT_TYPES));

fn document_tables(language: Language) -> [&'static [(Regex, &'static str)]; 2] {
   match language {
      Language::En => [&EN_DOCUMENT_TABLE, &AR_DOCUMENT_TABLE],
      Language::Ar => [&AR_DOCUMENT_TABLE, &EN_DOCUMENT_TABLE],
   }
}

fn extract_document_types(text: &str, language: Language, out: &mut Vec<Entity>) {
   for table in document_tables(language) {
      for (pattern, canonical) in table {
         if let Some(m) = pattern.find(text) {
            out.push(Entity::new(EntityType::DocumentType, m.as_str(), *canonical));
         }
      }
   }
}

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

// Leads only; the name itself is cut by `take_phrase` so that every lead in a
// query yields its own match.
static EN_AUTHOR: LazyLock<Regex> =
   LazyLock::new(|| re(r"\b(?:(?:written|authored|created|uploaded|sent)\s+)?by\s+"));
static AR_AUTHOR: LazyLock<Regex> =
   LazyLock::new(|| re(r"(?:بواسطة|كتبه|كتبها|من\s+تأليف|للكاتب|للمؤلف)\s+"));

/// Words that end a name or a topic phrase.
const EN_PHRASE_STOPS: &[&str] = &[
   "about", "regarding", "concerning", "from", "on", "in", "with", "during", "since", "before",
   "after", "dated", "yesterday", "today", "last", "this", "and", "or", "that", "which", "for",
   "to", "of", "by", "written", "created", "uploaded", "sent", "authored", "only", "sorted",
];

const AR_PHRASE_STOPS: &[&str] = &[
   "عن", "حول", "بخصوص", "بشأن", "من", "في", "منذ", "قبل", "بعد", "أمس", "امس", "اليوم", "و",
   "أو", "بواسطة", "كتبه", "كتبها", "فقط", "هذا", "هذه", "الماضي", "الماضية",
];

/// Field names that follow "sort by"/"filter by" rather than a person.
const NOT_AUTHORS: &[&str] =
   &["date", "type", "relevance", "title", "size", "department", "newest", "oldest"];

/// Field names that may precede the person: "filter by author John Smith".
const PERSON_FIELDS: &[&str] = &["author", "name"];

fn is_stop(word: &str) -> bool {
   let lowered = word.to_lowercase();
   EN_PHRASE_STOPS.contains(&lowered.as_str()) || AR_PHRASE_STOPS.contains(&lowered.as_str())
}

/// Takes leading words of `rest` up to the first stop word, quote or
/// `max_words`, returning the trimmed slice.
fn take_phrase(rest: &str, max_words: usize) -> Option<&str> {
   let mut end = 0;
   let mut taken = 0;

   for (offset, word) in word_spans(rest) {
      if taken == max_words || is_stop(word) || word.starts_with(['"', '“', '«']) {
         break;
      }
      end = offset + word.len();
      taken += 1;
   }

   let phrase = rest[..end].trim().trim_end_matches(['.', ',', ';', '?', '!', '؟', '،']);
   (!phrase.is_empty()).then_some(phrase)
}

fn word_spans(text: &str) -> impl Iterator<Item = (usize, &str)> {
   text
      .split_whitespace()
      .map(move |word| (word.as_ptr() as usize - text.as_ptr() as usize, word))
}

fn title_case(name: &str) -> String {
   name
      .split_whitespace()
      .map(|word| {
         let mut chars = word.chars();
         chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
         })
      })
      .collect::<Vec<_>>()
      .join(" ")
}

fn author_after(rest: &str) -> Option<&str> {
   let rest = match word_spans(rest).next() {
      Some((offset, word)) if PERSON_FIELDS.contains(&word.to_lowercase().as_str()) => {
         &rest[offset + word.len()..]
      },
      _ => rest,
   };

   let name = take_phrase(rest, 3)?;
   let first = name.split_whitespace().next()?.to_lowercase();
   if NOT_AUTHORS.contains(&first.as_str()) || !first.starts_with(char::is_alphabetic) {
      return None;
   }
   Some(name)
}

fn extract_authors(text: &str, out: &mut Vec<Entity>) {
   for pattern in [&*EN_AUTHOR, &*AR_AUTHOR] {
      for lead in pattern.find_iter(text) {
         if let Some(name) = author_after(&text[lead.end()..]) {
            out.push(Entity::new(EntityType::Author, name, title_case(name)));
         }
      }
   }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Relative {
   Today,
   Yesterday,
   DaysAgo,
   ThisWeek,
   LastWeek,
   ThisMonth,
   LastMonth,
   ThisYear,
   LastYear,
}

impl Relative {
   fn resolve(self, today: NaiveDate, count: Option<u64>) -> Option<NaiveDate> {
      match self {
         Self::Today => Some(today),
         Self::Yesterday => today.checked_sub_days(Days::new(1)),
         Self::DaysAgo => today.checked_sub_days(Days::new(count?)),
         Self::ThisWeek => {
            today.checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
         },
         Self::LastWeek => today.checked_sub_days(Days::new(7)),
         Self::ThisMonth => today.with_day(1),
         Self::LastMonth => today.checked_sub_months(Months::new(1)),
         Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1),
         Self::LastYear => today.checked_sub_months(Months::new(12)),
      }
   }
}

const DATE_TERMS: &[(&str, Relative)] = &[
   (r"\btoday\b|\bاليوم\b", Relative::Today),
   (r"\byesterday\b|\bأمس\b|\bامس\b|\bالبارحة\b", Relative::Yesterday),
   (r"\b(\d{1,3})\s+days?\s+ago\b|\bقبل\s+(\d{1,3})\s+(?:أيام|ايام|يوم)\b", Relative::DaysAgo),
   (r"\bthis\s+week\b|\bهذا\s+الأسبوع\b|\bهذا\s+الاسبوع\b", Relative::ThisWeek),
   (r"\blast\s+week\b|\bالأسبوع\s+الماضي\b|\bالاسبوع\s+الماضي\b", Relative::LastWeek),
   (r"\bthis\s+month\b|\bهذا\s+الشهر\b", Relative::ThisMonth),
   (r"\blast\s+month\b|\bالشهر\s+الماضي\b", Relative::LastMonth),
   (r"\bthis\s+year\b|\bهذه\s+السنة\b|\bهذا\s+العام\b", Relative::ThisYear),
   (r"\blast\s+year\b|\bالسنة\s+الماضية\b|\bالعام\s+الماضي\b", Relative::LastYear),
];

static DATE_TABLE: LazyLock<Vec<(Regex, Relative)>> = LazyLock::new(|| table(DATE_TERMS));
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| re(r"\b\d{4}-\d{2}-\d{2}\b"));

fn extract_dates(text: &str, today: NaiveDate, out: &mut Vec<Entity>) {
   for (pattern, relative) in DATE_TABLE.iter() {
      let Some(caps) = pattern.captures(text) else {
         continue;
      };
      let whole = caps.get(0).map_or("", |m| m.as_str());
      let count = caps
         .iter()
         .skip(1)
         .flatten()
         .find_map(|m| m.as_str().parse::<u64>().ok());

      let normalized = relative
         .resolve(today, count)
         .map_or_else(|| whole.to_lowercase(), |d| d.format("%Y-%m-%d").to_string());
      out.push(Entity::new(EntityType::Date, whole, normalized));
   }

   for m in ISO_DATE.find_iter(text) {
      if NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").is_ok() {
         out.push(Entity::new(EntityType::Date, m.as_str(), m.as_str()));
      }
   }
}

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

static QUOTED: LazyLock<Regex> = LazyLock::new(|| re(r#""([^"]+)"|“([^”]+)”|«([^»]+)»"#));
static TOPIC_LEAD: LazyLock<Regex> = LazyLock::new(|| {
   re(r"\b(?:about|regarding|concerning|on the topic of)\s+|(?:حول|بخصوص|بشأن)\s+")
});

fn extract_topics(text: &str, out: &mut Vec<Entity>) {
   for caps in QUOTED.captures_iter(text) {
      if let Some(inner) = caps.iter().skip(1).flatten().next() {
         let topic = inner.as_str().trim();
         if !topic.is_empty() {
            out.push(Entity::new(EntityType::Topic, topic, topic.to_lowercase()));
         }
      }
   }

   for lead in TOPIC_LEAD.find_iter(text) {
      // quoted phrases were handled above
      if let Some(topic) = take_phrase(&text[lead.end()..], 4) {
         out.push(Entity::new(EntityType::Topic, topic, topic.to_lowercase()));
      }
   }
}

/// Extracts every entity category from `text`. Categories are scanned in a
/// fixed order (document types, authors, dates, topics) and duplicates by
/// `(type, normalized)` are dropped.
pub fn extract(text: &str, language: Language, today: NaiveDate) -> Vec<Entity> {
   let mut found = Vec::new();
   extract_document_types(text, language, &mut found);
   extract_authors(text, &mut found);
   extract_dates(text, today, &mut found);
   extract_topics(text, &mut found);

   let mut entities: Vec<Entity> = Vec::with_capacity(found.len());
   for entity in found {
      let duplicate = entities
         .iter()
         .any(|e| e.kind == entity.kind && e.normalized == entity.normalized);
      if !duplicate {
         entities.push(entity);
      }
   }
   entities
}
