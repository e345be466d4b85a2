#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use postwire::{BlogClient, PostAttachments, ViewState};
use postwire_api_types::{NewPost, PostPatch, PostQuery};
use serde_json::json;
use tracing::info;

use crate::args::PostsCmd;
use crate::client::CliError;
use crate::io::{load_upload, load_uploads, read_opt_value, read_value};
use crate::print::{print_fetched, print_json};

pub async fn handle(client: &BlogClient, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List {
            page,
            page_size,
            published,
            all,
        } => {
            let query = PostQuery {
                published: if all { None } else { Some(published.unwrap_or(true)) },
                page,
                page_size,
            };
            print_fetched(client.posts().list(&query).await)
        }
        PostsCmd::Get { id } => get(client, id).await,
        PostsCmd::Create {
            title,
            content,
            content_file,
            published,
            slug,
            featured_image,
            images,
        } => {
            let post = NewPost {
                title,
                content: read_value(content, content_file)?,
                published,
                slug,
            };
            let attachments = attachments(featured_image, &images).await?;
            let created = client.posts().create(&post, attachments).await?;
            print_json(&created)
        }
        PostsCmd::Update {
            id,
            title,
            content,
            content_file,
            published,
            slug,
            featured_image,
            images,
        } => {
            let patch = PostPatch {
                title,
                content: read_opt_value(content, content_file)?,
                published,
                slug,
            };
            let attachments = attachments(featured_image, &images).await?;
            let updated = client.posts().update(id, &patch, attachments).await?;
            print_json(&updated)
        }
        PostsCmd::Delete { id } => {
            let deleted = client.posts().delete(id).await?;
            print_json(&json!({ "id": id, "deleted": deleted }))
        }
        PostsCmd::UploadImages { id, paths } => {
            let uploads = load_uploads(&paths).await?;
            let images = client.posts().upload_images(id, uploads).await?;
            print_json(&images)
        }
        PostsCmd::Preview {
            title,
            content,
            content_file,
            featured_image,
        } => {
            let content = read_value(content, content_file)?;
            let featured_image = match featured_image {
                Some(path) => Some(load_upload(&path).await?),
                None => None,
            };
            let rendered = client
                .posts()
                .preview(&title, &content, featured_image)
                .await?;
            print_json(&rendered)
        }
        PostsCmd::CheckLinks {
            content,
            content_file,
        } => {
            let content = read_value(content, content_file)?;
            print_json(&client.posts().check_links(&content).await?)
        }
    }
}

/// A single invocation starts with an empty cache, so this always paints
/// nothing first and then waits for the fetch to settle.
async fn get(client: &BlogClient, id: u64) -> Result<(), CliError> {
    let view = client.open_post(id);
    match view.settled().await {
        ViewState::Fresh(post) => print_json(&post),
        ViewState::Failed { fallback, error } => {
            print_json(&fallback)?;
            Err(CliError::Degraded(error))
        }
        other => {
            info!(target = "postwire_cli", id, "view ended without a post");
            Err(CliError::Degraded(format!("view for post {id} ended as {other:?}")))
        }
    }
}

async fn attachments(
    featured_image: Option<PathBuf>,
    images: &[PathBuf],
) -> Result<PostAttachments, CliError> {
    let featured_image = match featured_image {
        Some(path) => Some(load_upload(&path).await?),
        None => None,
    };
    Ok(PostAttachments {
        featured_image,
        additional_images: load_uploads(images).await?,
    })
}
