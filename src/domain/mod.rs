pub mod devotional;
pub mod notification;
pub mod token;
pub mod user;
