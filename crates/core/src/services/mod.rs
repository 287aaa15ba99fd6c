//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod friendship;
pub mod group;
pub mod media;
pub mod post;
pub mod profile;
pub mod user;

pub use comment::{CommentService, CreateCommentInput, UpdateCommentInput};
pub use friendship::FriendshipService;
pub use group::{AddMembersResult, CreateGroupCommentInput, CreateGroupInput, CreateGroupPostInput, GroupService};
pub use media::{MediaService, UploadKind, ValidatedImage};
pub use post::{CreatePostInput, LikeToggle, PostService, UpdatePostInput};
pub use profile::{ProfileService, UpdateProfileInput};
pub use user::{CreateUserInput, UpdateUserInput, UserService};
