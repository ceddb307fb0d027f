/// The institutional payroll number ("número económico").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeNumber(String);

impl EmployeeNumber {
    pub fn parse(s: String) -> Result<EmployeeNumber, String> {
        let trimmed = s.trim();
        let is_valid = !trimmed.is_empty()
            && trimmed.chars().count() <= 32
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

        if is_valid {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(format!("{} is not a valid employee number", s))
        }
    }
}

impl AsRef<str> for EmployeeNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
