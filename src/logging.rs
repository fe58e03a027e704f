use std::sync::Once;

use log::LevelFilter;

/// Crates below the renderer that log per-call detail at info.
const GPU_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax, e.g. "shapes3d=debug". Falls back to
    /// `RUST_LOG`, then to `level`.
    pub env_filter: Option<String>,
    pub level: LevelFilter,
    /// Cap for the GPU stack; an explicit filter naming one of those crates
    /// still wins.
    pub gpu_level: LevelFilter,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            level: LevelFilter::Info,
            gpu_level: LevelFilter::Warn,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    fn filter(&self) -> Option<String> {
        let non_blank = |f: &String| !f.trim().is_empty();
        self.env_filter
            .clone()
            .filter(non_blank)
            .or_else(|| std::env::var("RUST_LOG").ok().filter(non_blank))
    }
}

static INIT: Once = Once::new();

/// Installs the global logger on first call; later calls are no-ops.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.level);
        for module in GPU_MODULES {
            builder.filter_module(module, config.gpu_level);
        }
        if let Some(filter) = config.filter() {
            builder.parse_filters(&filter);
        }
        builder.write_style(config.write_style);
        builder.init();

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_beats_environment() {
        let config = LoggingConfig {
            env_filter: Some("shapes3d=trace".to_string()),
            ..Default::default()
        };
        assert_eq!(config.filter().as_deref(), Some("shapes3d=trace"));
    }

    #[test]
    fn blank_filter_is_ignored() {
        let config = LoggingConfig {
            env_filter: Some("  ".to_string()),
            ..Default::default()
        };
        // Falls through to RUST_LOG, which may or may not be set.
        assert_ne!(config.filter().as_deref(), Some("  "));
    }
}
