use std::{collections::BTreeMap, path::Path, time::Duration};

use anyhow::{Context, Result};
use console::style;
use docquery::{
   QueryProcessor, SearchRequest, SearchService,
   config::Config,
   types::{DateRange, EntityType, ExportOptions, QueryIntent, SearchFilters, SearchResponse, SortOrder},
};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
   pub page:      usize,
   pub page_size: usize,
   pub sort:      SortOrder,
   pub types:     Vec<String>,
   pub authors:   Vec<String>,
   pub from:      Option<String>,
   pub to:        Option<String>,
   pub metadata:  BTreeMap<String, String>,
   pub interpret: bool,
   pub json:      bool,
   pub plain:     bool,
}

/// Folds document-type, author and date entities into `filters`, keeping
/// anything already set explicitly.
fn apply_intent(filters: &mut SearchFilters, intent: &QueryIntent) {
   if filters.document_types.is_empty() {
      filters.document_types = intent
         .entities_of(EntityType::DocumentType)
         .map(|e| e.normalized.clone())
         .collect();
   }
   if filters.authors.is_empty() {
      filters.authors = intent
         .entities_of(EntityType::Author)
         .map(|e| e.normalized.clone())
         .collect();
   }
   if filters.date_range.is_none()
      && let Some(date) = intent.entities_of(EntityType::Date).next()
   {
      filters.date_range = Some(DateRange { start: date.normalized.clone(), end: String::new() });
   }
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
   let spinner = ProgressBar::new_spinner();
   spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
   spinner.enable_steady_tick(Duration::from_millis(100));
   spinner.set_message(message);
   Ok(spinner)
}

pub async fn execute(config: &Config, query: &str, options: SearchOptions) -> Result<()> {
   let service = SearchService::from_config(config)?;

   let mut filters = SearchFilters {
      document_types: options.types.clone(),
      authors: options.authors.clone(),
      custom_metadata: options.metadata.clone(),
      ..SearchFilters::default()
   };
   if options.from.is_some() || options.to.is_some() {
      filters.date_range = Some(DateRange {
         start: options.from.clone().unwrap_or_default(),
         end:   options.to.clone().unwrap_or_default(),
      });
   }

   if options.interpret {
      let intent = QueryProcessor::new().process_query(query, None);
      apply_intent(&mut filters, &intent);
      tracing::debug!(?filters, "filters derived from query");
   }

   let progress = (!options.json && !options.plain)
      .then(|| spinner("Searching..."))
      .transpose()?;

   let mut request = SearchRequest::new(query, &filters);
   request.page = options.page;
   request.page_size = options.page_size;
   request.sort = options.sort;
   let response = service.search(request).await;

   if let Some(progress) = progress {
      progress.finish_and_clear();
   }
   let response = response?;

   if options.json {
      println!("{}", serde_json::to_string(&response)?);
      return Ok(());
   }

   if response.results.is_empty() {
      println!("No results found for '{query}'");
      if !options.interpret {
         println!("\nTip: Use --interpret to turn types, authors and dates in the query into filters");
      }
      return Ok(());
   }

   format_results(&response, query, &options);
   Ok(())
}

/// 1-based position of the `index`th result on the requested page.
fn rank(options: &SearchOptions, index: usize) -> usize {
   (options.page.max(1) - 1)
      .saturating_mul(options.page_size)
      .saturating_add(index + 1)
}

fn format_results(response: &SearchResponse, query: &str, options: &SearchOptions) {

   if options.plain {
      println!("\nSearch results for: {query}");
      println!("{} total, {} ms\n", response.total_results, response.time_taken);
   } else {
      println!("\n{}", style(format!("Search results for: {query}")).bold());
      println!(
         "{}",
         style(format!("{} total, {} ms\n", response.total_results, response.time_taken)).dim()
      );
   }

   for (i, result) in response.results.iter().enumerate() {
      if options.plain {
         println!(
            "{}. {} [{}] by {} (score: {:.3})",
            rank(options, i),
            result.title,
            result.document_type,
            result.author,
            result.score
         );
         for fragment in &result.highlights {
            println!("  {fragment}");
         }
      } else {
         print!("{} ", style(format!("{}.", rank(options, i))).bold().cyan());
         print!("{}", style(&result.title).green());
         print!(" {}", style(format!("[{}]", result.document_type)).yellow());
         print!(" {}", style(format!("by {}", result.author)).dim());
         print!(" {}", style(format!("(score: {:.3})", result.score)).dim());
         println!();

         if result.highlights.is_empty() {
            let snippet: Vec<&str> = result.content.lines().take(3).collect();
            for line in snippet {
               println!("  {line}");
            }
         } else {
            for fragment in &result.highlights {
               let fragment = fragment.replace("<mark>", "").replace("</mark>", "");
               println!("  {fragment}");
            }
         }
      }

      println!();
   }

   if let Some(aggregations) = &response.aggregations {
      for (name, buckets) in aggregations {
         if buckets.is_empty() {
            continue;
         }
         let summary = buckets
            .iter()
            .map(|b| format!("{} ({})", b.key, b.doc_count))
            .collect::<Vec<_>>()
            .join(", ");
         println!("{} {summary}", style(format!("{name}:")).bold());
      }
   }
}

pub async fn suggest(config: &Config, prefix: &str, types: &[String], limit: Option<usize>) -> Result<()> {
   let service = SearchService::from_config(config)?;
   let suggestions = service.get_suggestions(prefix, types, limit).await;

   if suggestions.is_empty() {
      println!("{}", style("No suggestions").dim());
      return Ok(());
   }

   for suggestion in suggestions {
      match suggestion.kind {
         Some(kind) => println!("{} {}", suggestion.text, style(format!("[{kind}]")).dim()),
         None => println!("{}", suggestion.text),
      }
   }
   Ok(())
}

pub async fn export(config: &Config, query: &str, options: &ExportOptions, output: &Path) -> Result<()> {
   let service = SearchService::from_config(config)?;
   let progress = spinner("Exporting...")?;

   let payload = service
      .export_results(query, &SearchFilters::default(), options)
      .await;
   progress.finish_and_clear();
   let payload = payload?;

   std::fs::write(output, &payload)
      .with_context(|| format!("failed to write {}", output.display()))?;
   println!(
      "{} {} ({} bytes)",
      style("Exported to").green(),
      output.display(),
      payload.len()
   );
   Ok(())
}
