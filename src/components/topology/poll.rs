//! Snapshot polling: one fetch at a time, the next one scheduled only after
//! the previous one resolved.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use js_sys::Promise;
use log::{error, warn};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use super::state::TopologyState;
use super::types::Snapshot;

pub const DEFAULT_ENDPOINT: &str = "/api/aggregate/";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
	pub endpoint: String,
	/// Delay after a fetch resolves before the next one starts, on success
	/// and on failure alike.
	pub interval: Duration,
}

impl Default for PollConfig {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_ENDPOINT.into(),
			interval: DEFAULT_INTERVAL,
		}
	}
}

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("no browser window available")]
	NoWindow,
	#[error("request failed: {0}")]
	Transport(String),
	#[error("server answered with status {0}")]
	Status(u16),
	#[error("could not read response body: {0}")]
	Body(String),
	#[error("could not schedule the next poll: {0}")]
	Timer(String),
	#[error("malformed snapshot: {0}")]
	Malformed(#[from] serde_json::Error),
}

fn describe(value: JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Fetches and parses one snapshot.
pub async fn fetch_snapshot(endpoint: &str) -> Result<Snapshot, FetchError> {
	let window = web_sys::window().ok_or(FetchError::NoWindow)?;
	let response = JsFuture::from(window.fetch_with_str(endpoint))
		.await
		.map_err(|e| FetchError::Transport(describe(e)))?;
	let response: Response = response
		.dyn_into()
		.map_err(|e| FetchError::Transport(describe(e)))?;
	if !response.ok() {
		return Err(FetchError::Status(response.status()));
	}

	let text = response.text().map_err(|e| FetchError::Body(describe(e)))?;
	let text = JsFuture::from(text)
		.await
		.map_err(|e| FetchError::Body(describe(e)))?;
	let body = text
		.as_string()
		.ok_or_else(|| FetchError::Body("body is not text".into()))?;
	Ok(serde_json::from_str(&body)?)
}

/// Resolves after `duration` on the browser's timer.
///
/// Fails instead of pending forever when no timer can be scheduled.
async fn sleep(duration: Duration) -> Result<(), FetchError> {
	let window = web_sys::window().ok_or(FetchError::NoWindow)?;
	let millis = duration.as_millis().min(i32::MAX as u128) as i32;
	let mut refused = None;
	let promise = Promise::new(&mut |resolve, _| {
		refused = window
			.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
			.err();
	});
	if let Some(e) = refused {
		return Err(FetchError::Timer(describe(e)));
	}
	JsFuture::from(promise)
		.await
		.map_err(|e| FetchError::Timer(describe(e)))?;
	Ok(())
}

/// Whether polling can go on after the timer failed with `err`.
fn keeps_polling(err: &FetchError) -> bool {
	!matches!(err, FetchError::NoWindow)
}

/// Polls forever, handing every result to the shared state.
///
/// Only a missing window ends the loop, since neither fetch nor timer can
/// work without one.
pub async fn run(state: Rc<RefCell<Option<TopologyState>>>, config: PollConfig) {
	loop {
		let result = fetch_snapshot(&config.endpoint).await;
		if let Some(ref mut s) = *state.borrow_mut() {
			s.on_fetch(result);
		}
		if let Err(err) = sleep(config.interval).await {
			if !keeps_polling(&err) {
				error!("polling stopped: {err}");
				return;
			}
			warn!("retrying without delay: {err}");
		}
	}
}
