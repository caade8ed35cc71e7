use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroUsize,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Arg, Command};
use config::{Config, Environment, File};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use url::Url;

use crate::{batcher::MAX_ALERTS_PER_MESSAGE, log::LogSettings};

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// prefix of environment variables overriding config keys, e.g. `ZOOM_PROXY_BATCH_LIMIT`
const ENV_PREFIX: &str = "ZOOM_PROXY";

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: IpAddr,
    pub port: u16,
    /// base url of the zoom chat api
    pub chat_host: Url,
    /// maximum number of alerts per zoom message
    pub batch_limit: NonZeroUsize,
    /// deadline of a single webhook request, fractional seconds
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub delivery_timeout: Duration,
    pub log: LogSettings,
}

impl Settings {
    pub fn global() -> &'static Self {
        SETTINGS.get_or_init(|| {
            match Self::load().context("failed to load config and command line arguments") {
                Ok(settings) => settings,
                Err(err) => {
                    // tracing wasn't setup yet
                    panic!("{:#?}", err);
                }
            }
        })
    }

    pub fn to_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    fn load() -> Result<Self> {
        let opts = Command::new(clap::crate_name!())
            .version(clap::crate_version!())
            .about(clap::crate_description!())
            .args(&[
                Arg::new("config")
                    .help("path of config file")
                    .takes_value(true)
                    .short('c')
                    .long("config")
                    .default_value("./config.yaml"),
                Arg::new("level")
                    .help("log level")
                    .possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
                    .ignore_case(true)
                    .takes_value(true)
                    .long("log"),
            ])
            .get_matches();

        let config_path = opts.value_of("config").unwrap_or("./config.yaml");

        let mut settings =
            Self::from_sources(Some(config_path), std::env::var("PORT").ok())?;

        if let Some(level) = opts.value_of("level") {
            settings.log.level = level.to_string();
        }

        Ok(settings)
    }

    /// Layers built-in defaults, the optional config file, `ZOOM_PROXY_*`
    /// environment variables and finally `port`.
    pub fn from_sources(config_path: Option<&str>, port: Option<String>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("chat_host", "https://inbots.zoom.us")?
            .set_default("batch_limit", MAX_ALERTS_PER_MESSAGE as i64)?
            .set_default("delivery_timeout", 10.0)?
            .set_default("log.level", "info")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let conf = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("port", port)?
            .build()
            .context("can't load config")?;

        let settings: Self = conf.try_deserialize().context("can't load config")?;

        if settings.delivery_timeout.is_zero() {
            anyhow::bail!("delivery_timeout must be greater than zero");
        }

        Ok(settings)
    }
}
