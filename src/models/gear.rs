use crate::models::location::ValidationError;

pub const DESCRIPTION_MAX_CHARS: usize = 255;

/// A piece of shared gear carried on a trip.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: i64,
    pub trip_id: i64,
    pub description: String,
    pub quantity: u32,
}

/// Assignment of an item to a trip member. `accept_reqd` mirrors the member
/// invite flow: set until the owner confirms they are bringing it.
#[derive(Debug, Clone)]
pub struct ItemOwner {
    pub id: i64,
    pub item_id: i64,
    pub user_id: i64,
    pub accept_reqd: bool,
}

/// An item joined with the usernames of its owners, for the gear page.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub item: Item,
    pub owners: Vec<String>,
}

pub fn validate_item(description: &str, quantity: u32) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new(
            "description",
            "An item description is required",
        ));
    }
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ValidationError::new(
            "description",
            format!("Item descriptions are limited to {DESCRIPTION_MAX_CHARS} characters"),
        ));
    }
    if quantity == 0 {
        return Err(ValidationError::new(
            "quantity",
            "Bring at least one of each item",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_validation_covers_description_and_quantity() {
        assert!(validate_item("Stove", 1).is_ok());
        assert_eq!(
            validate_item("", 1).expect_err("empty").field,
            "description"
        );
        assert_eq!(
            validate_item(&"x".repeat(256), 1).expect_err("long").field,
            "description"
        );
        assert_eq!(validate_item("Stove", 0).expect_err("zero").field, "quantity");
    }
}
