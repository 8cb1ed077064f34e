use anyhow::Result;
use console::style;
use docquery::{SearchService, config::Config, types::IndexHealth};

pub async fn execute(config: &Config) -> Result<()> {
   let service = SearchService::from_config(config)?;

   let status = match service.get_index_status().await {
      Ok(status) => status,
      Err(e) => {
         println!("{} {}", style("●").red(), style(format!("unreachable ({e})")).dim());
         return Ok(());
      },
   };

   let dot = match status.index_health {
      IndexHealth::Green => style("●").green(),
      IndexHealth::Yellow => style("●").yellow(),
      IndexHealth::Red => style("●").red(),
      IndexHealth::Unknown => style("●").dim(),
   };
   let health = format!("{:?}", status.index_health).to_lowercase();

   println!("{}", style("Search index:").bold());
   println!();
   println!("  {dot} {} {}", config.search.base_url, style(format!("({health})")).dim());
   println!("  {} documents", status.total_documents);
   match status.last_indexed {
      Some(at) => println!("  last indexed {at}"),
      None => println!("  {}", style("never indexed").dim()),
   }

   Ok(())
}
