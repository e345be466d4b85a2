#![deny(clippy::all, clippy::pedantic)]

use postwire::BlogClient;
use postwire_api_types::{CommentQuery, NewComment};

use crate::args::CommentsCmd;
use crate::client::CliError;
use crate::io::read_value;
use crate::print::{print_fetched, print_json};

pub async fn handle(client: &BlogClient, cmd: CommentsCmd) -> Result<(), CliError> {
    let comments = client.comments();
    match cmd {
        CommentsCmd::List {
            post,
            status,
            page,
            page_size,
        } => {
            let mut query = status
                .moderation()
                .map(CommentQuery::with_status)
                .unwrap_or_default();
            query.post = post;
            query.page = page;
            query.page_size = page_size;
            print_fetched(comments.list(&query).await)
        }
        CommentsCmd::Thread { post } => print_fetched(comments.thread(post).await),
        CommentsCmd::Submit {
            post,
            content,
            content_file,
            author_name,
            author_email,
        } => {
            let comment = NewComment {
                author_name,
                author_email,
                ..NewComment::new(post, read_value(content, content_file)?)
            };
            print_json(&comments.submit(&comment).await?)
        }
        CommentsCmd::Approve { id } => print_json(&comments.approve(id).await?),
        CommentsCmd::Reject { id } => print_json(&comments.reject(id).await?),
        CommentsCmd::Reply {
            id,
            text,
            text_file,
        } => {
            let text = read_value(text, text_file)?;
            print_json(&comments.reply(id, &text).await?)
        }
        CommentsCmd::BulkApprove { ids } => print_json(&comments.bulk_approve(&ids).await?),
        CommentsCmd::BulkReject { ids } => print_json(&comments.bulk_reject(&ids).await?),
        CommentsCmd::PendingCount => print_fetched(comments.pending_count().await),
    }
}
