use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::info;

/// Types of authentication events
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AuthEventType {
    /// User login attempt
    Login,
    /// User logout
    Logout,
    /// Token refresh
    TokenRefresh,
    /// Token revocation
    TokenRevocation,
    /// User registration
    Registration,
    /// Email verification
    EmailVerification,
    /// Failed login attempt
    FailedLogin,
    /// Account locked after repeated failures
    AccountLocked,
    /// Access denied to resource
    AccessDenied,
    /// Token validation
    TokenValidation,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
            AuthEventType::TokenRefresh => write!(f, "TOKEN_REFRESH"),
            AuthEventType::TokenRevocation => write!(f, "TOKEN_REVOCATION"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::EmailVerification => write!(f, "EMAIL_VERIFICATION"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::AccountLocked => write!(f, "ACCOUNT_LOCKED"),
            AuthEventType::AccessDenied => write!(f, "ACCESS_DENIED"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Type of authentication event
    pub event_type: AuthEventType,
    /// User ID (if available)
    pub user_id: Option<String>,
    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,
    /// IP address of the client
    pub ip_address: Option<String>,
    /// Whether the event was successful
    pub success: bool,
    /// Additional details about the event
    pub details: Option<String>,
    /// The resource being accessed (if applicable)
    pub resource: Option<String>,
    /// Duration of the operation in milliseconds (if applicable)
    pub duration_ms: Option<u64>,
    /// Authentication method used (password, token, etc.)
    pub auth_method: Option<String>,
}

impl AuthEvent {
    /// Create a new authentication event
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            ip_address: None,
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    /// Set the IP address
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Set the resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the authentication method
    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Log an authentication event
pub fn log_auth_event(event: AuthEvent) {
    // Log to tracing
    let user_id_str = event.user_id.as_deref().unwrap_or("anonymous");
    let status = if event.success { "SUCCESS" } else { "FAILURE" };
    let details = event.details.as_deref().unwrap_or("");

    info!(
        "AUTH-LOG [{}] [{}] [{}] [{}] {}",
        event.event_type,
        user_id_str,
        status,
        event.timestamp.to_rfc3339(),
        details
    );
}

/// Log a successful login
pub fn log_successful_login(user_id: &str) {
    let event = AuthEvent::new(AuthEventType::Login, Some(user_id), true)
        .with_auth_method("password");

    log_auth_event(event);
}

/// Log a failed login attempt
pub fn log_failed_login(email: &str, reason: &str) {
    let event = AuthEvent::new(AuthEventType::FailedLogin, Some(email), false)
        .with_details(reason)
        .with_auth_method("password");

    log_auth_event(event);
}

/// Log an account lockout
pub fn log_account_locked(user_id: &str, attempts: u32) {
    let event = AuthEvent::new(AuthEventType::AccountLocked, Some(user_id), false)
        .with_details(format!("Account locked after {} failed attempts", attempts));

    log_auth_event(event);
}

/// Log a user registration
pub fn log_registration(user_id: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::Registration, Some(user_id), success);

    if let Some(d) = details {
        event = event.with_details(d);
    }

    log_auth_event(event);
}

/// Log an email verification attempt
pub fn log_email_verification(user_id: &str, success: bool) {
    let event = AuthEvent::new(AuthEventType::EmailVerification, Some(user_id), success);
    log_auth_event(event);
}

/// Log a token refresh
pub fn log_token_refresh(user_id: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRefresh, Some(user_id), success);

    if let Some(d) = details {
        event = event.with_details(d);
    }

    log_auth_event(event);
}

/// Log a logout event
pub fn log_logout(user_id: &str) {
    let event = AuthEvent::new(AuthEventType::Logout, Some(user_id), true);
    log_auth_event(event);
}

/// Log an access denied event
pub fn log_access_denied(user_id: &str, resource: &str, required_roles: &[String]) {
    let details = format!("Required roles: {}", required_roles.join(", "));

    let event = AuthEvent::new(AuthEventType::AccessDenied, Some(user_id), false)
        .with_resource(resource)
        .with_details(details);

    log_auth_event(event);
}
