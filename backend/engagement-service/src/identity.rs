//! Identity of the caller, passed explicitly into every feed operation.

use crate::error::{ServiceError, ServiceResult};
use actix_web::HttpRequest;
use uuid::Uuid;

/// Header carrying the authenticated user id, set by the gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Supplies the current actor for one operation
pub trait IdentityProvider: Send + Sync {
    /// `None` means the caller is anonymous
    fn current_user(&self) -> Option<Uuid>;

    fn require_user(&self) -> ServiceResult<Uuid> {
        self.current_user()
            .ok_or_else(|| ServiceError::Unauthorized("login required".to_string()))
    }
}

/// Fixed identity, resolved before the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(Uuid),
    Anonymous,
}

impl IdentityProvider for Actor {
    fn current_user(&self) -> Option<Uuid> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Anonymous => None,
        }
    }
}

impl Actor {
    /// Resolve the actor from request headers.
    ///
    /// A missing header is anonymous; a malformed one is rejected.
    pub fn from_request(req: &HttpRequest) -> ServiceResult<Self> {
        match req.headers().get(USER_ID_HEADER) {
            None => Ok(Actor::Anonymous),
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| ServiceError::InvalidInput("x-user-id is not ASCII".into()))?;
                Uuid::parse_str(raw.trim())
                    .map(Actor::User)
                    .map_err(|_| ServiceError::InvalidInput(format!("invalid x-user-id: {}", raw)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_anonymous_without_header() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(Actor::from_request(&req).unwrap(), Actor::Anonymous);
    }

    #[test]
    fn test_user_from_header() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, id.to_string()))
            .to_http_request();
        assert_eq!(Actor::from_request(&req).unwrap(), Actor::User(id));
    }

    #[test]
    fn test_malformed_header_is_invalid_input() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-uuid"))
            .to_http_request();
        assert!(matches!(
            Actor::from_request(&req),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_require_user() {
        assert!(matches!(
            Actor::Anonymous.require_user(),
            Err(ServiceError::Unauthorized(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(Actor::User(id).require_user().unwrap(), id);
    }
}
