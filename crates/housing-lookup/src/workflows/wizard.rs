//! Multi-step submission forms validated one step at a time.

use serde::Serialize;

use crate::lookup::Candidate;

/// Validation rule for one field of draft `D`.
pub struct FieldRule<D> {
    pub field: &'static str,
    pub check: fn(&D) -> Result<(), String>,
}

impl<D> FieldRule<D> {
    pub const fn new(field: &'static str, check: fn(&D) -> Result<(), String>) -> Self {
        Self { field, check }
    }
}

impl<D> Clone for FieldRule<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for FieldRule<D> {}

impl<D> std::fmt::Debug for FieldRule<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule").field("field", &self.field).finish()
    }
}

/// A step owns the fields it validates; `advance` never looks at other steps.
#[derive(Debug, Clone)]
pub struct WizardStep<D> {
    pub key: &'static str,
    pub title: &'static str,
    pub rules: Vec<FieldRule<D>>,
}

impl<D> WizardStep<D> {
    pub fn new(key: &'static str, title: &'static str, rules: Vec<FieldRule<D>>) -> Self {
        Self { key, title, rules }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.field)
    }

    pub fn validate(&self, draft: &D) -> Vec<FieldError> {
        self.rules
            .iter()
            .filter_map(|rule| {
                (rule.check)(draft).err().map(|message| FieldError {
                    field: rule.field,
                    message,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("step {step} has {} invalid field(s)", errors.len())]
    StepInvalid {
        step: &'static str,
        errors: Vec<FieldError>,
    },
    #[error("already on the last step")]
    NoNextStep,
}

impl WizardError {
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::StepInvalid { errors, .. } => errors,
            Self::NoNextStep => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionWizard<D> {
    steps: Vec<WizardStep<D>>,
    current: usize,
    draft: D,
}

impl<D> SubmissionWizard<D> {
    pub fn new(steps: Vec<WizardStep<D>>, draft: D) -> Self {
        Self {
            steps,
            current: 0,
            draft,
        }
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut D {
        &mut self.draft
    }

    pub fn steps(&self) -> &[WizardStep<D>] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&WizardStep<D>> {
        self.steps.get(self.current)
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// Validate the current step and move forward. On failure `current_index` is unchanged.
    pub fn advance(&mut self) -> Result<&'static str, WizardError> {
        let Some(step) = self.steps.get(self.current) else {
            return Err(WizardError::NoNextStep);
        };
        let errors = step.validate(&self.draft);
        if !errors.is_empty() {
            return Err(WizardError::StepInvalid {
                step: step.key,
                errors,
            });
        }
        match self.steps.get(self.current + 1) {
            Some(next) => {
                self.current += 1;
                Ok(next.key)
            }
            None => Err(WizardError::NoNextStep),
        }
    }

    /// Step back without validating. Returns false on the first step.
    pub fn back(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Validate every step in order and report the first one that fails.
    pub fn submit(&self) -> Result<&D, WizardError> {
        for step in &self.steps {
            let errors = step.validate(&self.draft);
            if !errors.is_empty() {
                return Err(WizardError::StepInvalid {
                    step: step.key,
                    errors,
                });
            }
        }
        Ok(&self.draft)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    Studio,
    Room,
    BoardingHouse,
}

impl PropertyKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Apartment => "Apartment",
            Self::Studio => "Studio",
            Self::Room => "Room",
            Self::BoardingHouse => "Boarding House",
        }
    }

    /// Container listings are reviewed and rented room by room.
    pub const fn is_container(self) -> bool {
        matches!(self, Self::BoardingHouse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomDraft {
    pub label: String,
    pub capacity: u8,
}

impl RoomDraft {
    pub fn new(label: impl Into<String>, capacity: u8) -> Self {
        Self {
            label: label.into(),
            capacity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyDraft {
    pub title: String,
    pub kind: Option<PropertyKind>,
    pub city: Option<Candidate>,
    pub address: String,
    pub nearest_institution: Option<Candidate>,
    pub monthly_rent: Option<u32>,
    pub deposit: Option<u32>,
    pub rooms: Vec<RoomDraft>,
}

impl PropertyDraft {
    /// Commit a city pick from the lookup field. A different city invalidates the institution.
    pub fn set_city(&mut self, city: Candidate) {
        if self.city.as_ref().map(|current| &current.id) != Some(&city.id) {
            self.nearest_institution = None;
        }
        self.city = Some(city);
    }

    pub fn set_nearest_institution(&mut self, institution: Candidate) {
        self.nearest_institution = Some(institution);
    }
}

fn require_text(value: &str, what: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{what} is required"))
    } else {
        Ok(())
    }
}

fn check_title(draft: &PropertyDraft) -> Result<(), String> {
    require_text(&draft.title, "title")
}

fn check_kind(draft: &PropertyDraft) -> Result<(), String> {
    draft
        .kind
        .map(|_| ())
        .ok_or_else(|| "choose a property type".to_string())
}

fn check_city(draft: &PropertyDraft) -> Result<(), String> {
    draft
        .city
        .as_ref()
        .map(|_| ())
        .ok_or_else(|| "select a city from the list".to_string())
}

fn check_address(draft: &PropertyDraft) -> Result<(), String> {
    require_text(&draft.address, "address")
}

fn check_institution(draft: &PropertyDraft) -> Result<(), String> {
    let institution = draft
        .nearest_institution
        .as_ref()
        .ok_or_else(|| "select the nearest institution".to_string())?;
    match (&draft.city, &institution.parent) {
        (Some(city), Some(parent)) if parent != &city.name => {
            Err(format!("{} is not in {}", institution.name, city.name))
        }
        _ => Ok(()),
    }
}

fn check_rent(draft: &PropertyDraft) -> Result<(), String> {
    match draft.monthly_rent {
        Some(rent) if rent > 0 => Ok(()),
        Some(_) => Err("monthly rent must be greater than zero".to_string()),
        None => Err("monthly rent is required".to_string()),
    }
}

fn check_deposit(draft: &PropertyDraft) -> Result<(), String> {
    let deposit = draft
        .deposit
        .ok_or_else(|| "deposit is required (use 0 for none)".to_string())?;
    match draft.monthly_rent {
        Some(rent) if u64::from(deposit) > 2 * u64::from(rent) => {
            Err("deposit cannot exceed two months of rent".to_string())
        }
        _ => Ok(()),
    }
}

fn check_rooms(draft: &PropertyDraft) -> Result<(), String> {
    let minimum = match draft.kind {
        Some(kind) if kind.is_container() => 2,
        _ => 1,
    };
    if draft.rooms.len() < minimum {
        return Err(format!("add at least {minimum} room(s)"));
    }
    if draft.rooms.iter().any(|room| room.capacity == 0) {
        return Err("every room needs a capacity of at least one".to_string());
    }
    Ok(())
}

/// The four-step listing submission flow: basics, location, pricing, rooms.
pub fn property_submission_wizard() -> SubmissionWizard<PropertyDraft> {
    SubmissionWizard::new(
        vec![
            WizardStep::new(
                "basics",
                "Basics",
                vec![
                    FieldRule::new("title", check_title),
                    FieldRule::new("kind", check_kind),
                ],
            ),
            WizardStep::new(
                "location",
                "Location",
                vec![
                    FieldRule::new("city", check_city),
                    FieldRule::new("address", check_address),
                    FieldRule::new("nearest_institution", check_institution),
                ],
            ),
            WizardStep::new(
                "pricing",
                "Pricing",
                vec![
                    FieldRule::new("monthly_rent", check_rent),
                    FieldRule::new("deposit", check_deposit),
                ],
            ),
            WizardStep::new("rooms", "Rooms", vec![FieldRule::new("rooms", check_rooms)]),
        ],
        PropertyDraft::default(),
    )
}
