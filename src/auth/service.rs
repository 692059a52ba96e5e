// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{
    error::AuthError,
    models::{
        normalize_username, AuthResponse, ChangePasswordRequest, CredentialsRequest, Role,
        SessionUser, User, UserChanges, UserResponse,
    },
    password::PasswordService,
    token::{Claims, TokenService, TokenSubject},
};
use crate::store::{Store, StoreError};

/// A successful sign-in: the response body and the refresh token for the cookie
#[derive(Debug)]
pub struct IssuedSession {
    pub response: AuthResponse,
    pub refresh_token: String,
}

/// Authentication service coordinating all auth operations
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenService,
    passwords: PasswordService,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, passwords: PasswordService) -> Self {
        Self {
            store,
            tokens,
            passwords,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    fn issue_session(&self, user: &User) -> Result<IssuedSession, AuthError> {
        let session_user = SessionUser::from(user);
        let subject = TokenSubject {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        };
        let (access_token, refresh_token) = self.tokens.sign_token_pair(&subject)?;

        Ok(IssuedSession {
            response: AuthResponse {
                access_token,
                user: session_user,
            },
            refresh_token,
        })
    }

    /// Register a new user with role `user`
    pub async fn register(&self, request: &CredentialsRequest) -> Result<IssuedSession, AuthError> {
        let username = normalize_username(&request.username);

        if self.store.find_user_by_username(&username).await?.is_some() {
            warn!("Registration rejected, username taken: {}", username);
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.passwords.hash_password(&request.password)?;
        let user = self
            .store
            .create_user(&username, &password_hash, Role::User)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::from(other),
            })?;

        info!("Registered user_id={} username={}", user.id, user.username);
        self.issue_session(&user)
    }

    /// Login a user; unknown user and wrong password are indistinguishable
    pub async fn login(&self, request: &CredentialsRequest) -> Result<IssuedSession, AuthError> {
        let username = normalize_username(&request.username);

        let Some(user) = self.store.find_user_by_username(&username).await? else {
            debug!("Login for unknown username: {}", username);
            self.passwords.verify_dummy(&request.password);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.passwords.verify_password(&request.password, &user.password_hash)? {
            debug!("Login with wrong password for user_id={}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User logged in: user_id={}", user.id);
        self.issue_session(&user)
    }

    /// Mints a new access token from a refresh token's claims
    ///
    /// The store is not consulted, so a role change or deletion only takes
    /// effect once the refresh token expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AuthError> {
        let claims: Claims = self
            .tokens
            .verify_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let subject = TokenSubject::from(&claims);
        let access_token = self.tokens.sign_access_token(&subject)?;

        debug!("Refreshed access token for user_id={}", subject.user_id);
        Ok(AuthResponse {
            access_token,
            user: SessionUser {
                id: subject.user_id,
                username: subject.username,
                role: subject.role,
            },
        })
    }

    /// Profile of the signed-in user
    pub async fn me(&self, user_id: i32) -> Result<UserResponse, AuthError> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        if request.current_password == request.new_password {
            return Err(AuthError::PasswordUnchanged);
        }

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .passwords
            .verify_password(&request.current_password, &user.password_hash)?
        {
            warn!("Password change with wrong current password for user_id={}", user_id);
            return Err(AuthError::IncorrectPassword);
        }

        let password_hash = self.passwords.hash_password(&request.new_password)?;
        self.store
            .update_user(
                user_id,
                UserChanges {
                    role: None,
                    password_hash: Some(password_hash),
                },
            )
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!("Password updated for user_id={}", user_id);
        Ok(())
    }
}
