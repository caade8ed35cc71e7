use std::{net::TcpListener, sync::Arc};

use anyhow::{Context, Result};
use prometheus::Registry;
use zoom_proxy::{
	alertmanager_webhook_receiver::{self, State},
	log,
	metrics::Metrics,
	settings::Settings,
	zoom_client::ZoomClient,
};

/// exit the complete program if one thread panics
fn setup_panic_handler() {
	let default_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		default_panic(info);
		std::process::exit(1);
	}));
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
	setup_panic_handler();

	let settings = Settings::global();

	log::setup_logging(&settings.log).context("could not setup logging")?;

	let registry = Registry::new();
	let metrics = Arc::new(Metrics::new(&registry).context("failed to register metrics")?);

	let client = ZoomClient::new(
		settings.chat_host.clone(),
		settings.delivery_timeout,
		Arc::clone(&metrics),
	);
	let state = Arc::new(State::new(Arc::new(client), settings.batch_limit, metrics));

	let addr = settings.to_socket_addr();
	let listener = TcpListener::bind(addr).context(format!("failed to bind {}", addr))?;

	tracing::info!("listening on: {}", addr);

	alertmanager_webhook_receiver::run_webhook_receiver(listener, state, registry).await
}
