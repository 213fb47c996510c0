pub mod admin_user;
pub mod blog_post;
pub mod new_blog_post;
pub mod pagination;
pub mod post_content;
pub mod post_tags;
pub mod post_title;
pub mod principal;
pub mod slug;
pub mod subscriber;
pub mod subscriber_email;
