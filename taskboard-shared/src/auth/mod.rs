/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Session token generation and validation
/// - [`reset_token`]: Password recovery tokens
/// - [`login_attempts`]: Failed-login tracking and temporary blocks
/// - [`middleware`]: The `AuthContext` extractor and token authentication
/// - [`authorization`]: Project, task and subtask permission policy
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Kanban#2030")?;
/// assert!(verify_password("Kanban#2030", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "Ada".to_string());
/// let token = create_token(&claims, "a-secret-key-that-is-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod login_attempts;
pub mod middleware;
pub mod password;
pub mod reset_token;
