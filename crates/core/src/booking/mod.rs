pub mod states;
pub mod wizard;

pub use states::{RentalTerms, WizardStep};
pub use wizard::{BookingWizard, WizardError, WizardState};
