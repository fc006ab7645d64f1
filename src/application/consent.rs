use crate::domain::cashier::ConsentSubmission;
use crate::error::{CashierError, Result};

/// The funds-protection consent form. Both boxes must be ticked before it
/// can be submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentForm {
    funds_protection: bool,
    terms: bool,
}

impl ConsentForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form with both acknowledgements already given.
    pub fn accepted() -> Self {
        Self::new().acknowledge_funds_protection().accept_terms()
    }

    pub fn acknowledge_funds_protection(mut self) -> Self {
        self.funds_protection = true;
        self
    }

    pub fn accept_terms(mut self) -> Self {
        self.terms = true;
        self
    }

    pub fn is_submittable(&self) -> bool {
        self.funds_protection && self.terms
    }

    pub fn submission(&self) -> Result<ConsentSubmission> {
        if !self.is_submittable() {
            return Err(CashierError::ConsentIncomplete);
        }
        Ok(ConsentSubmission {
            ukgc_funds_protection: 1,
            tnc_approval: 1,
        })
    }
}
