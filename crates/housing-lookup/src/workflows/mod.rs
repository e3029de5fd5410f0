//! Back-office state machines: listing/user/payment review and multi-step submission.

pub mod review;
pub mod wizard;

pub use review::{
    transition, ContainerReview, ReviewAction, ReviewEvent, ReviewGateway, ReviewState,
    ReviewSubject, ReviewTransition, ReviewWorkflow, SubjectKind, TransitionError, UnitDecision,
};
pub use wizard::{
    property_submission_wizard, FieldError, FieldRule, PropertyDraft, PropertyKind, RoomDraft,
    SubmissionWizard, WizardError, WizardStep,
};
