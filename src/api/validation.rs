use super::FieldError;
use crate::models::post::PostStatus;

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_DISPLAY_NAME_LEN: usize = 150;
pub const MAX_BIO_LEN: usize = 1000;
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_login(username_or_email: Option<&str>, password: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if username_or_email.is_none_or(|v| v.trim().is_empty()) {
        errors.push(FieldError::new(
            "usernameOrEmail",
            "Username or email is required",
        ));
    }

    if password.is_none_or(str::is_empty) {
        errors.push(FieldError::new("password", "Password is required"));
    }

    errors
}

pub fn validate_password_change(
    current_password: Option<&str>,
    new_password: Option<&str>,
    confirm_password: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if current_password.is_none_or(str::is_empty) {
        errors.push(FieldError::new(
            "currentPassword",
            "Current password is required",
        ));
    }

    if new_password.is_none_or(|v| v.chars().count() < MIN_PASSWORD_LEN) {
        errors.push(FieldError::new(
            "newPassword",
            "New password must be at least 6 characters",
        ));
    }

    if confirm_password != new_password {
        errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
    }

    errors
}

pub fn validate_post(
    title: Option<&str>,
    content: Option<&str>,
    status: Option<&str>,
    category: Option<&str>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let title_len = title.map_or(0, |v| v.trim().chars().count());
    if title_len == 0 || title_len > MAX_TITLE_LEN {
        errors.push(FieldError::new(
            "title",
            "Title must be between 1 and 255 characters",
        ));
    }

    if content.is_none_or(|v| v.trim().is_empty()) {
        errors.push(FieldError::new("content", "Content is required"));
    }

    if let Some(status) = status
        && PostStatus::parse(status).is_none()
    {
        errors.push(FieldError::new(
            "status",
            "Status must be draft, published, or archived",
        ));
    }

    if let Some(category) = category
        && category.chars().count() > MAX_CATEGORY_LEN
    {
        errors.push(FieldError::new(
            "category",
            "Category must be less than 100 characters",
        ));
    }

    errors
}

/// Profile fields reject with a single message, not a field list.
pub fn validate_profile(display_name: Option<&str>, bio: Option<&str>) -> Result<(), String> {
    if let Some(name) = display_name {
        if name.trim().is_empty() {
            return Err("Display name cannot be empty".to_string());
        }
        if name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err("Display name cannot exceed 150 characters".to_string());
        }
    }

    if let Some(bio) = bio
        && bio.chars().count() > MAX_BIO_LEN
    {
        return Err("Bio cannot exceed 1000 characters".to_string());
    }

    Ok(())
}
