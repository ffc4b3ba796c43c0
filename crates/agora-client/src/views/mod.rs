//! Application views. Each one is written against
//! [`DocumentStore`](agora_store::DocumentStore) and holds only its own state.

pub mod composer;
pub mod feed;
pub mod gate;
pub mod post_card;
pub mod profile;
pub mod sidebar;
pub mod stories;

pub use composer::Composer;
pub use feed::{Feed, FeedState};
pub use gate::AuthGate;
pub use post_card::PostCard;
pub use profile::{ProfileField, ProfilePage};
pub use stories::AuthorEntry;
