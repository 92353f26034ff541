//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Every call takes the acting user's id explicitly and re-reads the store.

mod account;
mod follow;
mod notification;
mod post;
mod profile;
mod suggestion;

pub use account::{AccountService, NewAccount};
pub use follow::{FollowOutcome, FollowService};
pub use notification::NotificationService;
pub use post::{LikeOutcome, LikeToggle, NewPost, PostService};
pub use profile::{ProfilePatch, ProfileService};
pub use suggestion::SuggestionService;
