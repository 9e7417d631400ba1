use crate::error::ApiError;

/// Caller identity established by the auth middleware. A missing or invalid
/// bearer token yields `Anonymous`; rejection is the route policy's call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    User(String),
    Admin(String),
}

impl Caller {
    pub fn username(&self) -> Option<&str> {
        match self {
            Caller::Anonymous => None,
            Caller::User(name) | Caller::Admin(name) => Some(name),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin(_))
    }
}

/// Per-route access policy, most restrictive first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutePolicy<'a> {
    AdminOnly,
    SelfOrAdmin(&'a str),
    AuthenticatedOnly,
    Public,
}

/// Decide whether `caller` may invoke a route guarded by `policy`.
///
/// Pure function of (caller class, policy, optional target identity); denial
/// always surfaces as Unauthorized, never as silently filtered data.
pub fn authorize(caller: &Caller, policy: RoutePolicy<'_>) -> Result<(), ApiError> {
    let allowed = match policy {
        RoutePolicy::AdminOnly => caller.is_admin(),
        RoutePolicy::SelfOrAdmin(target) => {
            caller.is_admin() || matches!(caller, Caller::User(name) if name == target)
        }
        RoutePolicy::AuthenticatedOnly => !matches!(caller, Caller::Anonymous),
        RoutePolicy::Public => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::unauthorized("Unauthorized"))
    }
}
