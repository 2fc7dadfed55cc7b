use std::fmt;

/// Ordered list of full, human-readable validation messages.
///
/// Messages are built from an attribute label and a reason, the way the
/// tracker renders them: `"Hours" + "cannot be blank"` becomes
/// `"Hours cannot be blank"`. Order of insertion is preserved; it is the
/// order clients see.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `"<attribute> <reason>"`.
    pub fn add(&mut self, attribute: &str, reason: &str) {
        self.messages.push(format!("{attribute} {reason}"));
    }

    /// Record a message that is not tied to an attribute.
    pub fn add_base(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn blank(&mut self, attribute: &str) {
        self.add(attribute, "cannot be blank");
    }

    pub fn invalid(&mut self, attribute: &str) {
        self.add(attribute, "is invalid");
    }

    pub fn too_long(&mut self, attribute: &str, max: usize) {
        self.add(attribute, &format!("is too long (maximum is {max} characters)"));
    }

    pub fn too_short(&mut self, attribute: &str, min: usize) {
        self.add(attribute, &format!("is too short (minimum is {min} characters)"));
    }

    pub fn not_included(&mut self, attribute: &str) {
        self.add(attribute, "is not included in the list");
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.messages.extend(other.messages);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn full_messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }

    /// `Ok(())` if nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Human label for a field key: `"due_date"` → `"Due date"`,
/// `"status_id"` → `"Status"`.
pub fn humanize(key: &str) -> String {
    let base = key.strip_suffix("_id").unwrap_or(key).replace('_', " ");
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_insertion_order() {
        let mut e = ValidationErrors::new();
        e.blank("Hours");
        e.invalid("Issue");
        e.too_long("Comment", 1024);
        assert_eq!(
            e.full_messages(),
            [
                "Hours cannot be blank",
                "Issue is invalid",
                "Comment is too long (maximum is 1024 characters)",
            ]
        );
        assert_eq!(e.len(), 3);
    }

    #[test]
    fn into_result() {
        assert!(ValidationErrors::new().into_result().is_ok());
        let mut e = ValidationErrors::new();
        e.add_base("nope");
        assert_eq!(e.clone().into_result().unwrap_err(), e);
        assert_eq!(e.to_string(), "nope");
    }

    #[test]
    fn humanize_keys() {
        assert_eq!(humanize("due_date"), "Due date");
        assert_eq!(humanize("status_id"), "Status");
        assert_eq!(humanize("subject"), "Subject");
        assert_eq!(humanize(""), "");
    }
}
