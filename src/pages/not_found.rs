use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<div class="not-found">
			<h1>"Nothing here"</h1>
			<p>
				"There is no environment at this address. " <a href="/">"Back to the environment view"</a>
			</p>
		</div>
	}
}
