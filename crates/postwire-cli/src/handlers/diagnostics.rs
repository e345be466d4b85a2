#![deny(clippy::all, clippy::pedantic)]

use postwire::BlogClient;

use crate::client::CliError;
use crate::print::print_fetched;

pub async fn handle(client: &BlogClient) -> Result<(), CliError> {
    print_fetched(client.diagnostics().info().await)
}
