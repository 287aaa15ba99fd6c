//! SeaORM entity definitions.

pub mod comment;
pub mod friend_request;
pub mod friendship;
pub mod group;
pub mod group_comment;
pub mod group_member;
pub mod group_post;
pub mod post;
pub mod post_like;
pub mod user;
pub mod user_profile;

pub use comment::Entity as Comment;
pub use friend_request::Entity as FriendRequest;
pub use friendship::Entity as Friendship;
pub use group::Entity as Group;
pub use group_comment::Entity as GroupComment;
pub use group_member::Entity as GroupMember;
pub use group_post::Entity as GroupPost;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use user::Entity as User;
pub use user_profile::Entity as UserProfile;
