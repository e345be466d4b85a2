//! Client-side caching.
//!
//! - [`LocalEntityCache`]: last-known entity per id, kept for the session.
//! - [`Revalidation`]: cache-then-revalidate state of one opened view.
//! - [`PostNavigator`]: the current post view, optionally cancelling the
//!   previous one on navigation.

mod lock;
mod navigator;
mod revalidate;
mod store;

pub use navigator::PostNavigator;
pub use revalidate::{Revalidation, ViewState};
pub use store::LocalEntityCache;
