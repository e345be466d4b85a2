#![deny(clippy::all, clippy::pedantic)]

use postwire::BlogClient;
use serde_json::json;

use crate::args::ImagesCmd;
use crate::client::CliError;
use crate::io::load_upload;
use crate::print::{print_fetched, print_json};

pub async fn handle(client: &BlogClient, cmd: ImagesCmd) -> Result<(), CliError> {
    let images = client.images();
    match cmd {
        ImagesCmd::List { page } => print_fetched(images.list(page).await),
        ImagesCmd::Get { id } => print_fetched(images.get(id).await),
        ImagesCmd::Upload { post, path } => {
            let upload = load_upload(&path).await?;
            let image = images.upload(post, upload).await?;
            let url = images.url(&image).map(String::from);
            print_json(&json!({ "image": image, "url": url }))
        }
        ImagesCmd::Delete { id } => {
            let deleted = images.delete(id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }
        ImagesCmd::Url { reference } => {
            let url = client
                .media()
                .resolve(&reference)
                .ok_or_else(|| CliError::InvalidInput(format!("cannot resolve `{reference}`")))?;
            println!("{url}");
            Ok(())
        }
    }
}
