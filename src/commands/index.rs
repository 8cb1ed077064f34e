use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;
use docquery::{SearchService, config::Config, types::Document};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
   Many(Vec<Document>),
   One(Box<Document>),
}

fn load_documents(path: &Path) -> Result<Vec<Document>> {
   let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read {}", path.display()))?;
   let parsed: DocumentFile = serde_json::from_str(&raw)
      .with_context(|| format!("{} is not a document or a list of documents", path.display()))?;

   let mut documents = match parsed {
      DocumentFile::Many(docs) => docs,
      DocumentFile::One(doc) => vec![*doc],
   };
   for doc in &mut documents {
      if doc.id.is_empty() {
         doc.id = uuid::Uuid::new_v4().to_string();
      }
   }
   Ok(documents)
}

pub async fn execute(config: &Config, file: &Path) -> Result<()> {
   let documents = load_documents(file)?;
   let service = SearchService::from_config(config)?;

   match documents.as_slice() {
      [] => bail!("{} contains no documents", file.display()),
      [doc] => {
         let outcome = service.index_document(doc).await?;
         println!(
            "{} {}",
            style("Indexed").green(),
            outcome.document_id.as_deref().unwrap_or(&doc.id)
         );
      },
      docs => {
         let outcome = service.batch_index_documents(docs).await?;
         for item in &outcome.results {
            if item.success {
               println!("  {} {}", style("●").green(), item.id);
            } else {
               println!(
                  "  {} {} {}",
                  style("●").red(),
                  item.id,
                  style(item.error.as_deref().unwrap_or("failed")).dim()
               );
            }
         }
         let failed = outcome.results.iter().filter(|r| !r.success).count();
         if failed > 0 {
            println!("{}", style(format!("{failed} of {} documents failed", docs.len())).yellow());
         } else {
            println!("{}", style(format!("Indexed {} documents", docs.len())).green());
         }
      },
   }

   Ok(())
}

pub async fn remove(config: &Config, id: &str) -> Result<()> {
   let service = SearchService::from_config(config)?;
   service.remove_document_from_index(id).await?;
   println!("{} {id}", style("Removed").green());
   Ok(())
}

pub async fn reindex(config: &Config, ids: &[String]) -> Result<()> {
   let service = SearchService::from_config(config)?;
   let job = service.reindex_documents(ids).await?;

   let scope = if ids.is_empty() {
      "all documents".to_string()
   } else {
      format!("{} documents", ids.len())
   };
   println!("{} {} {}", style("Reindex started:").bold(), job.job_id, style(format!("({scope})")).dim());
   Ok(())
}

#[cfg(test)]
mod tests {
   use tempfile::NamedTempFile;

   use super::*;

   #[test]
   fn single_document_gets_generated_id() {
      let file = NamedTempFile::new().unwrap();
      std::fs::write(file.path(), r#"{"title": "Lease agreement", "documentType": "pdf"}"#).unwrap();

      let docs = load_documents(file.path()).unwrap();
      assert_eq!(docs.len(), 1);
      assert_eq!(docs[0].document_type, "pdf");
      assert!(uuid::Uuid::parse_str(&docs[0].id).is_ok());
   }

   #[test]
   fn list_keeps_given_ids() {
      let file = NamedTempFile::new().unwrap();
      std::fs::write(file.path(), r#"[{"id": "a", "title": "A"}, {"id": "b", "title": "B"}]"#).unwrap();

      let ids: Vec<_> = load_documents(file.path()).unwrap().into_iter().map(|d| d.id).collect();
      assert_eq!(ids, vec!["a", "b"]);
   }
}
