/// Middleware modules for the API server
///
/// - `security`: security response headers
/// - `session`: session cookie authentication and the login guard

pub mod security;
pub mod session;
