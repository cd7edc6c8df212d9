use crate::models::location::ValidationError;

/// A vehicle a member may leave at the trailhead; listed on the per-trip
/// emergency-info page.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: i64,
    pub user_id: i64,
    pub make: String,
    pub model: String,
    pub year: String,
    pub color: String,
    pub lic_plate_num: String,
    pub lic_plate_st: String,
}

impl Vehicle {
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehicleDraft {
    pub make: String,
    pub model: String,
    pub year: String,
    pub color: String,
    pub lic_plate_num: String,
    pub lic_plate_st: String,
}

impl VehicleDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.make.trim().is_empty() {
            return Err(ValidationError::new("make", "A vehicle make is required"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("model", "A vehicle model is required"));
        }
        Ok(())
    }
}
