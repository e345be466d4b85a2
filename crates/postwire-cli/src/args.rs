//! Command-line surface for `postwire-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, builder::BoolishValueParser};
use postwire::config::ClientOverrides;
use postwire_api_types::ModerationStatus;

#[derive(Parser, Debug)]
#[command(name = "postwire-cli", version, about = "Blog API client with request coalescing", long_about = None)]
pub struct Cli {
    /// Extra TOML configuration file layered over `config/default.toml`
    #[arg(long = "config-file", env = "POSTWIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ClientOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and write posts
    Posts(PostsArgs),
    /// Images attached to posts
    Images(ImagesArgs),
    /// Comment threads and moderation
    Comments(CommentsArgs),
    /// Backend debug information
    Diagnostics,
}

#[derive(Parser, Debug)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsCmd,
}

#[derive(Subcommand, Debug)]
pub enum PostsCmd {
    /// List posts
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        /// Filter on the published flag (defaults to published only)
        #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
        published: Option<bool>,
        /// Include drafts and published posts alike
        #[arg(long, conflicts_with = "published")]
        all: bool,
    },
    /// Show one post, painting the cached copy first
    Get { id: u64 },
    /// Create a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long)]
        published: bool,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, value_name = "PATH")]
        featured_image: Option<PathBuf>,
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Patch a post; only the given fields change
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
        published: Option<bool>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, value_name = "PATH")]
        featured_image: Option<PathBuf>,
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Delete a post
    Delete { id: u64 },
    /// Attach extra images to a post
    UploadImages {
        id: u64,
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Render a draft without saving it
    Preview {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long, value_name = "PATH")]
        featured_image: Option<PathBuf>,
    },
    /// Report broken links in post content
    CheckLinks {
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
pub struct ImagesArgs {
    #[command(subcommand)]
    pub action: ImagesCmd,
}

#[derive(Subcommand, Debug)]
pub enum ImagesCmd {
    /// List images
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one image
    Get { id: u64 },
    /// Upload an image for a post
    Upload {
        #[arg(long)]
        post: u64,
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
    /// Delete an image
    Delete { id: u64 },
    /// Resolve an image reference to an absolute URL
    Url { reference: String },
}

#[derive(Parser, Debug)]
pub struct CommentsArgs {
    #[command(subcommand)]
    pub action: CommentsCmd,
}

#[derive(Subcommand, Debug)]
pub enum CommentsCmd {
    /// List comments
    List {
        #[arg(long)]
        post: Option<u64>,
        #[arg(long, default_value_t = StatusArg::All)]
        status: StatusArg,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Approved and pending comments of one post
    Thread { post: u64 },
    /// Submit a comment (lands in moderation)
    Submit {
        #[arg(long)]
        post: u64,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_email: Option<String>,
    },
    /// Approve a comment
    Approve { id: u64 },
    /// Reject a comment
    Reject { id: u64 },
    /// Set the admin reply on a comment
    Reply {
        id: u64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
    },
    /// Approve several comments at once
    BulkApprove {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Reject several comments at once
    BulkReject {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Number of comments awaiting moderation
    PendingCount,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum StatusArg {
    Pending,
    Approved,
    Rejected,
    All,
}

impl StatusArg {
    pub fn moderation(self) -> Option<ModerationStatus> {
        match self {
            StatusArg::Pending => Some(ModerationStatus::Pending),
            StatusArg::Approved => Some(ModerationStatus::Approved),
            StatusArg::Rejected => Some(ModerationStatus::Rejected),
            StatusArg::All => None,
        }
    }
}

impl fmt::Display for StatusArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusArg::Pending => "pending",
            StatusArg::Approved => "approved",
            StatusArg::Rejected => "rejected",
            StatusArg::All => "all",
        };
        f.write_str(s)
    }
}
