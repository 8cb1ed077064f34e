use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use docquery::{
   QueryProcessor,
   query::{ContextualQuery, UserContext},
   types::Language,
};

fn load_user(path: &Path) -> Result<UserContext> {
   let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
   serde_json::from_str(&raw).with_context(|| format!("invalid user context in {}", path.display()))
}

pub fn execute(query: &str, language: Option<Language>, user: Option<&Path>, json: bool) -> Result<()> {
   let processor = QueryProcessor::new();

   let (intent, contextual) = match user {
      Some(path) => {
         let user = load_user(path)?;
         let result = processor.process_query_with_context(query, language, Some(&user));
         if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
         }
         (result.intent, Some(result.contextual_query))
      },
      None => (processor.process_query(query, language), None),
   };
   let ambiguous = processor.is_ambiguous(query, intent.confidence);

   if json {
      println!("{}", serde_json::to_string_pretty(&intent)?);
      return Ok(());
   }

   println!(
      "{} {}/{} {}",
      style("Intent:").bold(),
      style(format!("{:?}", intent.kind).to_lowercase()).cyan(),
      intent.action,
      style(format!("(confidence: {:.2}, {})", intent.confidence, intent.language.code())).dim()
   );

   if intent.entities.is_empty() {
      println!("{}", style("No entities found").dim());
   } else {
      println!("{}", style("Entities:").bold());
      for entity in &intent.entities {
         let kind = serde_json::to_value(entity.kind)?;
         print!("  {} {}", style("●").green(), style(kind.as_str().unwrap_or("entity")).yellow());
         print!(" {}", entity.value);
         if entity.normalized != entity.value {
            print!(" {}", style(format!("→ {}", entity.normalized)).dim());
         }
         println!();
      }
   }

   if let Some(contextual) = &contextual {
      print_context(contextual);
   }

   if ambiguous {
      println!();
      println!("{}", style("This query is ambiguous. Consider:").yellow());
      for question in processor.generate_clarification_questions(query, intent.language) {
         println!("  - {question}");
      }
   }

   Ok(())
}

fn print_context(contextual: &ContextualQuery) {
   for org in &contextual.context.organizational {
      println!(
         "{} {} {}",
         style("Department:").bold(),
         org.name,
         style(format!("({})", org.terms.join(", "))).dim()
      );
   }
   if !contextual.suggested_terms.is_empty() {
      println!("{} {}", style("From your history:").bold(), contextual.suggested_terms.join(", "));
   }
}
