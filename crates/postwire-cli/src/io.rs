#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use postwire::Upload;

use crate::client::CliError;

pub fn read_value(val: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    if let Some(path) = file {
        read_file(&path)
    } else if let Some(v) = val {
        Ok(v)
    } else {
        Err(CliError::InvalidInput("value required".into()))
    }
}

pub fn read_opt_value(
    val: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<String>, CliError> {
    if let Some(path) = file {
        return read_file(&path).map(Some);
    }
    Ok(val)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })
}

pub async fn load_upload(path: &Path) -> Result<Upload, CliError> {
    Ok(Upload::from_path(path).await?)
}

pub async fn load_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>, CliError> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(load_upload(path).await?);
    }
    Ok(uploads)
}
