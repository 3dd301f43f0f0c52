mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register;
mod token;
mod user;

pub(crate) use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{CredentialsState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
pub(super) use token::Token;
pub use user::{User, UserId, create_user_table, get_user_by_email, get_user_by_id};
pub(crate) use user::create_user;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
