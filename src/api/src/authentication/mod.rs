mod middleware;
mod password;

pub use middleware::reject_anonymous_users;
pub use middleware::UserId;
pub use password::{
    compute_password_hash, validate_credentials, AdminCredentials, AuthError, Credentials,
};
