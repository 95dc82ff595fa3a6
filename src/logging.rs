// (C) Copyright 2020, by Germans Media Technology & Services
// glreview
// Logger setup

use std::sync::Once;

/// `filter` uses the `env_logger` syntax ("info", "glreview=debug").
/// Without one, `RUST_LOG` is consulted, then `info`.
#[derive(Clone,Debug)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Install `env_logger` (standard error) once; later calls do nothing.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        match config.filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            },
            None => {
                builder.filter_level(log::LevelFilter::Info);
            },
        }
        builder.write_style(config.write_style);
        builder.target(env_logger::Target::Stderr);
        builder.init();
        log::debug!("logging initialized");
    });
}
