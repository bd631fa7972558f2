// Bearer-token authentication and password hashing

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::{AdminUser, AuthUser};
pub use jwt::{Claims, TokenKeys};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
