//! Repository layer over the SeaORM entities.

mod comment;
mod friend_request;
mod friendship;
mod group;
mod group_post;
mod post;
mod post_like;
mod user;
mod user_profile;

pub use comment::CommentRepository;
pub use friend_request::FriendRequestRepository;
pub use friendship::FriendshipRepository;
pub use group::GroupRepository;
pub use group_post::GroupPostRepository;
pub use post::PostRepository;
pub use post_like::PostLikeRepository;
pub use user::UserRepository;
pub use user_profile::UserProfileRepository;
