/// Per-row progress through the consent form. Built fresh for every row and
/// dropped once the row's locator is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatingState {
    pub size_acknowledged: bool,
    pub confirmed: bool,
    pub email: Option<String>,
    pub mailing_list_opt_in: bool,
}

impl GatingState {
    /// True once every control sits at its required value: both
    /// acknowledgements checked, exactly `expected_email` entered, mailing
    /// list unchecked.
    pub fn is_satisfied(&self, expected_email: &str) -> bool {
        self.unmet(expected_email).is_none()
    }

    /// The first control that is off target, with the value it holds.
    pub fn unmet(&self, expected_email: &str) -> Option<(&'static str, String)> {
        if !self.size_acknowledged {
            return Some(("confirmSize", "false".to_string()));
        }
        if !self.confirmed {
            return Some(("confirmation", "false".to_string()));
        }
        match self.email.as_deref() {
            Some(email) if email == expected_email => {}
            other => return Some(("email", other.unwrap_or_default().to_string())),
        }
        if self.mailing_list_opt_in {
            return Some(("confirmJoinMailingList", "true".to_string()));
        }
        None
    }
}
