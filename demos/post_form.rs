//! Posts a small form and prints the settled response.
//!
//! ```sh
//! cargo run --example post_form -- https://httpbin.org/post
//! ```

use http_exchange::client::{Client, Request};
use http_exchange::types::{FileAttachment, MultipartForm};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://httpbin.org/post".to_string());

    let mut form = MultipartForm::new();
    form.append("name", "ada");
    form.append("tags", "compiler");
    form.append("tags", "pioneer");
    form.append_file(
        "notes",
        FileAttachment::new("notes.txt", "text/plain", "first program\n"),
    );

    let request = Request::post(&url)
        .with_body(form)
        .with_timeout(Duration::from_secs(10))
        .on_progress(|event| tracing::info!(loaded = event.loaded, "receiving"));

    let response = Client::new().execute(request).await?;

    tracing::info!(status = response.status, message = %response.message, "settled");
    if let Some(json) = response.data.as_json() {
        println!("{}", serde_json::to_string_pretty(json)?);
    } else if let Some(text) = response.data.as_text() {
        println!("{text}");
    }
    Ok(())
}
