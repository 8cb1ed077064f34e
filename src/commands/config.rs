use anyhow::Result;
use console::style;
use docquery::config::{self, Config};

pub fn execute(config: &Config) -> Result<()> {
   println!("{}", style(format!("# {}", config::config_path().display())).dim());
   print!("{}", config.to_toml()?);
   Ok(())
}
