// (C) Copyright 2020, by Germans Media Technology & Services
// glreview

use anyhow::Context;
use log::info;

use glreview::config::load_config;
use glreview::demo;
use glreview::logging::{init_logging,LoggingConfig};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        println!("usage:");
        println!();
        println!("    glreview <file>");
        println!();
        println!("where <file> is the demo config file (see assets/demos.yaml).");
        return Ok(());
    }
    init_logging(LoggingConfig::default());

    let demos = load_config(&args[1]).with_context(|| format!("unable to load config file {}",args[1]))?;
    for demo in &demos {
        demo::run(demo).with_context(|| format!("demo {} failed",demo.name))?;
        info!("demo {} closed",demo.name);
    }
    Ok(())
}
