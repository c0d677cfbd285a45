pub mod extract;
pub mod guard;
pub mod response;

pub use guard::{require_session, safe_callback, sign_in_url, SIGN_IN_PATH};
pub use response::{ApiResponse, ApiResult};
