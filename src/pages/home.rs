use leptos::prelude::*;

use crate::components::topology::TopologyCanvas;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TopologyCanvas fullscreen=true />
				<div class="graph-overlay">
					<h1>"Swarm"</h1>
					<p class="subtitle">"Hosts and containers, refreshed every few seconds. Drag to pan, scroll to zoom."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
