use shared::domain::NewCar;

use crate::error::{FormErrors, FormField};

pub const NAME_MAX_CHARS: usize = 50;
pub const DESCRIPTION_MAX_CHARS: usize = 280;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarForm {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub car_type: String,
    pub tags: Vec<String>,
}

impl CarForm {
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|existing| existing == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
    }

    pub fn validate(&self) -> Result<NewCar, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(FormField::Name, "Name is required");
        } else if name.chars().count() > NAME_MAX_CHARS {
            errors.insert(
                FormField::Name,
                format!("Name must be at most {NAME_MAX_CHARS} characters"),
            );
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.insert(FormField::Description, "Description is required");
        } else if description.chars().count() > DESCRIPTION_MAX_CHARS {
            errors.insert(
                FormField::Description,
                format!("Description must be at most {DESCRIPTION_MAX_CHARS} characters"),
            );
        }

        let image_url = self.image_url.trim();
        if image_url.is_empty() {
            errors.insert(FormField::ImageUrl, "Image URL is required");
        } else if !looks_like_http_url(image_url) {
            errors.insert(FormField::ImageUrl, "Please enter a valid URL");
        }

        if self.car_type.trim().is_empty() {
            errors.insert(FormField::CarType, "Car type is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewCar {
            name: name.to_string(),
            description: description.to_string(),
            image_url: image_url.to_string(),
            car_type: self.car_type.trim().to_string(),
            tags: self.tags.clone(),
        })
    }
}

/// `^https?://.+`
fn looks_like_http_url(value: &str) -> bool {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty())
}
