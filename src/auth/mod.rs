// Authentication module
// JWT access/refresh tokens, password hashing, and role-based route guards

pub mod cookie;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{
    change_password_handler, login_handler, logout_handler, me_handler, refresh_handler,
    register_handler,
};
pub use middleware::{authenticate, require_admin, require_member, AuthenticatedUser, RequireRole};
pub use models::{AuthResponse, LoginRequest, RegisterRequest, Role, User, UserResponse};
pub use password::PasswordService;
pub use service::AuthService;
pub use token::TokenService;
