use crate::models::location::ValidationError;

/// Someone to call when a trip goes wrong. Owned by a user, shown on the
/// emergency-info page of every trip that user is a member of.
#[derive(Debug, Clone)]
pub struct EmergencyContact {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub preferred_name: String,
    pub relationship: String,
    pub email: String,
    pub primary_phone: String,
    pub secondary_phone: String,
    pub street_address_line1: String,
    pub street_address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContactDraft {
    pub full_name: String,
    pub preferred_name: String,
    pub relationship: String,
    pub email: String,
    pub primary_phone: String,
    pub secondary_phone: String,
    pub street_address_line1: String,
    pub street_address_line2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ContactDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(ValidationError::new(
                "full_name",
                "A contact needs a full name",
            ));
        }
        if self.primary_phone.trim().is_empty() {
            return Err(ValidationError::new(
                "primary_phone",
                "A contact needs a primary phone number",
            ));
        }
        Ok(())
    }
}
