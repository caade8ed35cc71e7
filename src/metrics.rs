//! prometheus meters for alert processing and webhook delivery

use prometheus::{core::Collector, opts, IntCounter, IntCounterVec, Registry};

#[derive(Debug, Clone)]
/// counters shared by every in-flight webhook request
pub struct Metrics {
	/// total number of alerts turned into zoom message body items
	pub alerts_processed: IntCounter,
	/// zoom webhook responses by http status code
	pub send_requests: IntCounterVec,
}

impl Metrics {
	/// construct meters and register them in `registry`
	pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
		let alerts_processed = IntCounter::with_opts(
			opts!("processed_alerts_total", "The total number of processed alerts")
				.namespace("zoom_proxy"),
		)?;

		let send_requests = IntCounterVec::new(
			opts!(
				"send_request_total",
				"The total number of sending request by HTTP status code"
			)
			.namespace("zoom_proxy"),
			&["code"],
		)?;

		registry.register(Box::new(alerts_processed.clone()))?;
		registry.register(Box::new(send_requests.clone()))?;

		Ok(Self { alerts_processed, send_requests })
	}

	/// meters registered in a throwaway registry
	#[cfg(test)]
	pub(crate) fn unregistered() -> Self {
		Self::new(&Registry::new()).expect("fresh registry rejected meters")
	}

	/// counts one alert rendered into a message
	pub(crate) fn record_alert_processed(&self) {
		self.alerts_processed.inc();
	}

	/// counts one webhook response
	pub(crate) fn record_send(&self, status: reqwest::StatusCode) {
		self.send_requests.with_label_values(&[status.as_str()]).inc();
	}

	/// number of responses seen with `code`, reading doesn't create the series
	pub fn sends_with_code(&self, code: u16) -> u64 {
		let code = code.to_string();
		let families = self.send_requests.collect();

		let sends = families
			.iter()
			.flat_map(|family| family.get_metric())
			.find(|metric| {
				metric
					.get_label()
					.iter()
					.any(|label| label.get_name() == "code" && label.get_value() == code)
			})
			.map_or(0, |metric| metric.get_counter().get_value() as u64);

		sends
	}
}

#[cfg(test)]
mod tests {
	use prometheus::Encoder;

	use super::*;

	#[test]
	fn meters_are_exposed_under_zoom_proxy_namespace() {
		let registry = Registry::new();
		let metrics = Metrics::new(&registry).unwrap();

		metrics.record_alert_processed();
		metrics.record_send(reqwest::StatusCode::INTERNAL_SERVER_ERROR);

		let mut buffer = vec![];
		prometheus::TextEncoder::new().encode(&registry.gather(), &mut buffer).unwrap();
		let text = String::from_utf8(buffer).unwrap();

		assert!(text.contains("zoom_proxy_processed_alerts_total 1"));
		assert!(text.contains("zoom_proxy_send_request_total{code=\"500\"} 1"));
		assert_eq!(metrics.sends_with_code(500), 1);
	}

	#[test]
	fn reading_an_unseen_code_adds_no_series() {
		let registry = Registry::new();
		let metrics = Metrics::new(&registry).unwrap();
		metrics.record_send(reqwest::StatusCode::OK);

		assert_eq!(metrics.sends_with_code(500), 0);
		assert_eq!(metrics.sends_with_code(200), 1);

		let mut buffer = vec![];
		prometheus::TextEncoder::new().encode(&registry.gather(), &mut buffer).unwrap();
		let text = String::from_utf8(buffer).unwrap();

		assert!(!text.contains("code=\"500\""));
		assert!(text.contains("zoom_proxy_send_request_total{code=\"200\"} 1"));
	}

	#[test]
	fn registering_twice_fails() {
		let registry = Registry::new();
		Metrics::new(&registry).unwrap();

		assert!(Metrics::new(&registry).is_err());
	}
}
