use crate::models::location::ValidationError;

/// Membership of a registered user on a trip. `accept_reqd` is set when the
/// invite has not been accepted yet; `organizer` members may mutate the
/// trip.
#[derive(Debug, Clone)]
pub struct TripMember {
    pub id: i64,
    pub trip_id: i64,
    pub user_id: i64,
    pub organizer: bool,
    pub accept_reqd: bool,
}

/// A member joined with its user record, for the members page.
#[derive(Debug, Clone)]
pub struct MemberView {
    pub member: TripMember,
    pub username: String,
    pub email: String,
}

/// A guest has no account, just a name the organizer typed in.
#[derive(Debug, Clone)]
pub struct TripGuest {
    pub id: i64,
    pub trip_id: i64,
    pub name: String,
}

pub fn validate_guest_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "A guest name is required"));
    }
    Ok(())
}
