// handlers/public/mod.rs - pages reachable without a session
pub mod health;
pub mod signin;

pub use health::{health, root};
pub use signin::{signin_page, signin_submit, signout};
