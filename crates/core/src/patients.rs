//! Patient directory and medical profiles.
//!
//! A patient account owns at most one profile. Profile mutation goes through
//! an explicit per-role capability table: each role maps to the set of fields
//! it may change, and an update touching anything outside that set is refused
//! before any mutation happens. Patients edit their own identity and contact
//! details, doctors maintain the clinical fields, admins correct
//! administrative data.

use crate::accounts::{require_admin, Principal, Role};
use crate::error::{ClinicError, ClinicResult};
use crate::store::{self, ClinicStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use uuid::Uuid;

const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub relation: String,
    pub phone: String,
}

/// Stored patient profile document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`PatientDirectory::create_profile`].
#[derive(Clone, Debug)]
pub struct NewPatientProfile {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub blood_group: String,
    pub allergies: Vec<String>,
    pub medical_history: Vec<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

/// Mutable fields of a patient profile, for the capability table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatientField {
    Name,
    Age,
    BloodGroup,
    Allergies,
    MedicalHistory,
    EmergencyContact,
}

impl PatientField {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientField::Name => "name",
            PatientField::Age => "age",
            PatientField::BloodGroup => "blood_group",
            PatientField::Allergies => "allergies",
            PatientField::MedicalHistory => "medical_history",
            PatientField::EmergencyContact => "emergency_contact",
        }
    }
}

/// Capability table: the profile fields each role is allowed to mutate.
pub fn allowed_fields(role: Role) -> &'static [PatientField] {
    match role {
        Role::Patient => &[
            PatientField::Name,
            PatientField::Age,
            PatientField::EmergencyContact,
        ],
        Role::Doctor => &[PatientField::Allergies, PatientField::MedicalHistory],
        Role::Admin => &[
            PatientField::Name,
            PatientField::BloodGroup,
            PatientField::EmergencyContact,
        ],
    }
}

/// Partial update of a patient profile; absent fields are untouched.
#[derive(Clone, Debug, Default)]
pub struct PatientProfileUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub blood_group: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_history: Option<Vec<String>>,
    pub emergency_contact: Option<EmergencyContact>,
}

impl PatientProfileUpdate {
    fn touched(&self) -> Vec<PatientField> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push(PatientField::Name);
        }
        if self.age.is_some() {
            fields.push(PatientField::Age);
        }
        if self.blood_group.is_some() {
            fields.push(PatientField::BloodGroup);
        }
        if self.allergies.is_some() {
            fields.push(PatientField::Allergies);
        }
        if self.medical_history.is_some() {
            fields.push(PatientField::MedicalHistory);
        }
        if self.emergency_contact.is_some() {
            fields.push(PatientField::EmergencyContact);
        }
        fields
    }
}

/// Directory service over the patients collection.
#[derive(Clone)]
pub struct PatientDirectory {
    store: Arc<ClinicStore>,
}

impl PatientDirectory {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Create the profile for a patient account. One profile per account,
    /// enforced by the `patients_by_user` index inside a transaction.
    pub fn create_profile(
        &self,
        principal: &Principal,
        new: NewPatientProfile,
    ) -> ClinicResult<PatientProfile> {
        if principal.role != Role::Patient {
            return Err(ClinicError::Forbidden);
        }
        if new.name.trim().is_empty() {
            return Err(ClinicError::Validation("name is required".into()));
        }
        validate_blood_group(&new.blood_group)?;

        let now = Utc::now();
        let profile = PatientProfile {
            id: Uuid::new_v4(),
            user_id: principal.id,
            name: new.name.trim().to_owned(),
            age: new.age,
            gender: new.gender,
            blood_group: new.blood_group,
            allergies: new.allergies,
            medical_history: new.medical_history,
            emergency_contact: new.emergency_contact,
            created_at: now,
            updated_at: now,
        };
        let doc = store::encode_doc(&profile)?;

        (self.store.patients(), self.store.patients_by_user())
            .transaction(|(patients, by_user)| {
                if by_user.get(profile.user_id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::AlreadyExists("patient profile"),
                    ));
                }
                by_user.insert(profile.user_id.as_bytes(), profile.id.as_bytes())?;
                patients.insert(profile.id.as_bytes(), doc.as_slice())?;
                Ok(())
            })
            .map_err(ClinicError::from)?;

        tracing::info!(patient = %profile.id, "patient profile created");
        Ok(profile)
    }

    /// The calling patient's own profile.
    pub fn my_profile(&self, principal: &Principal) -> ClinicResult<PatientProfile> {
        if principal.role != Role::Patient {
            return Err(ClinicError::Forbidden);
        }
        self.profile_for_user(principal.id)
    }

    /// Fetch a profile by id. Admins and doctors may read any patient;
    /// patients only their own.
    pub fn get(&self, principal: &Principal, id: Uuid) -> ClinicResult<PatientProfile> {
        let profile = self.get_by_id(id)?;
        match principal.role {
            Role::Admin | Role::Doctor => Ok(profile),
            Role::Patient if profile.user_id == principal.id => Ok(profile),
            Role::Patient => Err(ClinicError::Forbidden),
        }
    }

    /// Admin: every patient profile.
    pub fn list(&self, principal: &Principal) -> ClinicResult<Vec<PatientProfile>> {
        require_admin(principal)?;
        let mut patients: Vec<PatientProfile> = store::scan_docs(self.store.patients())?;
        patients.sort_by_key(|p| p.created_at);
        Ok(patients)
    }

    /// Update a profile through the per-role capability table.
    ///
    /// Patients target their own profile; doctors and admins target by id.
    /// Every touched field must be in the actor's allowed set; otherwise the
    /// whole update is refused with `Forbidden` and nothing is written.
    pub fn update(
        &self,
        principal: &Principal,
        target: Option<Uuid>,
        update: PatientProfileUpdate,
    ) -> ClinicResult<PatientProfile> {
        let mut profile = match principal.role {
            Role::Patient => self.profile_for_user(principal.id)?,
            Role::Doctor | Role::Admin => {
                let id = target.ok_or_else(|| {
                    ClinicError::Validation("patient id is required".into())
                })?;
                self.get_by_id(id)?
            }
        };

        let allowed = allowed_fields(principal.role);
        for field in update.touched() {
            if !allowed.contains(&field) {
                tracing::warn!(
                    role = %principal.role,
                    field = field.as_str(),
                    "capability table refused profile update"
                );
                return Err(ClinicError::Forbidden);
            }
        }

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ClinicError::Validation("name cannot be empty".into()));
            }
            profile.name = name.trim().to_owned();
        }
        if let Some(age) = update.age {
            profile.age = age;
        }
        if let Some(blood_group) = update.blood_group {
            validate_blood_group(&blood_group)?;
            profile.blood_group = blood_group;
        }
        if let Some(allergies) = update.allergies {
            profile.allergies = allergies;
        }
        if let Some(medical_history) = update.medical_history {
            profile.medical_history = medical_history;
        }
        if let Some(contact) = update.emergency_contact {
            profile.emergency_contact = Some(contact);
        }

        profile.updated_at = Utc::now();
        store::put_doc(self.store.patients(), profile.id.as_bytes(), &profile)?;
        Ok(profile)
    }

    /// Delete a profile. Admins may delete any; patients only their own.
    pub fn delete(&self, principal: &Principal, id: Uuid) -> ClinicResult<()> {
        let profile = self.get_by_id(id)?;
        let allowed = principal.role == Role::Admin
            || (principal.role == Role::Patient && profile.user_id == principal.id);
        if !allowed {
            return Err(ClinicError::Forbidden);
        }

        (self.store.patients(), self.store.patients_by_user())
            .transaction(|(patients, by_user)| {
                patients.remove(profile.id.as_bytes())?;
                by_user.remove(profile.user_id.as_bytes())?;
                Ok::<_, ConflictableTransactionError<ClinicError>>(())
            })
            .map_err(ClinicError::from)?;

        tracing::info!(patient = %profile.id, "patient profile deleted");
        Ok(())
    }

    /// Append an entry to a patient's medical history. Admins or the patient
    /// themselves.
    pub fn add_medical_record(
        &self,
        principal: &Principal,
        id: Uuid,
        record: String,
    ) -> ClinicResult<PatientProfile> {
        if record.trim().is_empty() {
            return Err(ClinicError::Validation("medical record is required".into()));
        }

        let mut profile = self.get_by_id(id)?;
        let allowed = principal.role == Role::Admin
            || (principal.role == Role::Patient && profile.user_id == principal.id);
        if !allowed {
            return Err(ClinicError::Forbidden);
        }

        profile.medical_history.push(record.trim().to_owned());
        profile.updated_at = Utc::now();
        store::put_doc(self.store.patients(), profile.id.as_bytes(), &profile)?;
        Ok(profile)
    }

    pub(crate) fn get_by_id(&self, id: Uuid) -> ClinicResult<PatientProfile> {
        store::get_doc(self.store.patients(), id.as_bytes())?
            .ok_or(ClinicError::NotFound("patient"))
    }

    /// Resolve the profile owned by a user account.
    pub(crate) fn profile_for_user(&self, user_id: Uuid) -> ClinicResult<PatientProfile> {
        let id = self
            .store
            .patients_by_user()
            .get(user_id.as_bytes())?
            .ok_or(ClinicError::NotFound("patient profile"))?;
        store::get_doc(self.store.patients(), &id)?.ok_or(ClinicError::NotFound("patient profile"))
    }
}

fn validate_blood_group(blood_group: &str) -> ClinicResult<()> {
    if !BLOOD_GROUPS.contains(&blood_group) {
        return Err(ClinicError::Validation(format!(
            "invalid blood group: {blood_group}"
        )));
    }
    Ok(())
}
