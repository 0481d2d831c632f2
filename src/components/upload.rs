//! File picker and drop zone feeding [`crate::engine::Explorer::upload`].

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DragEvent, Event, File, HtmlInputElement};

use crate::api::{ApiError, UploadFile};
use crate::components::{SharedExplorer, refresh};

async fn read_file(file: &File) -> Result<UploadFile, ApiError> {
	let buffer = JsFuture::from(file.array_buffer())
		.await
		.map_err(|err| ApiError::Read(format!("{err:?}")))?;
	let mime = file.type_();
	Ok(UploadFile {
		name: file.name(),
		mime: (!mime.is_empty()).then_some(mime),
		bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
	})
}

fn start_upload(explorer: SharedExplorer, revision: RwSignal<u64>, file: File) {
	let Some(ex) = explorer.try_get_value() else {
		return;
	};
	spawn_local(async move {
		let upload = match read_file(&file).await {
			Ok(upload) => upload,
			Err(err) => {
				warn!("could not read {:?}: {err}", file.name());
				return;
			}
		};
		debug!("uploading {:?} ({} bytes)", upload.name, upload.bytes.len());
		futures::join!(ex.upload(upload), async { refresh(revision) });
		refresh(revision);
	});
}

#[component]
pub fn UploadPanel(explorer: SharedExplorer, revision: RwSignal<u64>) -> impl IntoView {
	let dragging = RwSignal::new(false);
	let uploading = move || {
		revision.track();
		explorer.with_value(|ex| ex.read(|s| s.is_uploading()))
	};

	let on_change = move |ev: Event| {
		let Some(input) = ev.target().and_then(|t| t.dyn_into::<HtmlInputElement>().ok()) else {
			return;
		};
		if let Some(file) = input.files().and_then(|files| files.get(0)) {
			start_upload(explorer, revision, file);
		}
		input.set_value("");
	};

	let on_drop = move |ev: DragEvent| {
		ev.prevent_default();
		dragging.set(false);
		let file = ev.data_transfer().and_then(|dt| dt.files()).and_then(|files| files.get(0));
		if let Some(file) = file {
			start_upload(explorer, revision, file);
		}
	};

	view! {
		<section
			class="upload-panel"
			class:dragging=move || dragging.get()
			on:dragover=move |ev: DragEvent| {
				ev.prevent_default();
				dragging.set(true);
			}
			on:dragleave=move |_| dragging.set(false)
			on:drop=on_drop
		>
			<h2>"Upload"</h2>
			<p>"Drop a document here or pick one."</p>
			<input type="file" on:change=on_change disabled=uploading />
			<Show when=uploading>
				<span class="uploading">"Uploading..."</span>
			</Show>
		</section>
	}
}
