//! Doctor directory: profiles, admin approval workflow and public listing.
//!
//! A doctor account owns at most one profile. Profiles go through an approval
//! workflow (`pending → approved`, admin-driven, with `suspended` and an
//! `is_active` kill switch); only approved, active doctors appear in the
//! public listing and can be booked. Editing a profile resets it to `pending`
//! so an admin must re-approve the changes.
//!
//! The consultation fee recorded here is what the booking service snapshots
//! onto new appointments.

use crate::accounts::{require_admin, Principal, Role};
use crate::error::{ClinicError, ClinicResult};
use crate::store::{self, ClinicStore};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use std::sync::Arc;
use uuid::Uuid;

/// Approval state of a doctor profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    Pending,
    Approved,
    Suspended,
}

/// Stored doctor profile document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub experience_years: u32,
    pub hospital_name: String,
    pub consultation_fee: Decimal,
    pub status: DoctorStatus,
    pub is_active: bool,
    pub rating: f32,
    pub num_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorProfile {
    /// Approved, active doctors are the only ones visible and bookable.
    pub fn is_bookable(&self) -> bool {
        self.status == DoctorStatus::Approved && self.is_active
    }
}

/// Input for [`DoctorDirectory::create_profile`].
#[derive(Clone, Debug)]
pub struct NewDoctorProfile {
    pub specialization: String,
    pub experience_years: u32,
    pub hospital_name: String,
    pub consultation_fee: Decimal,
}

/// Partial update of the doctor's own profile; absent fields are untouched.
#[derive(Clone, Debug, Default)]
pub struct DoctorProfileUpdate {
    pub specialization: Option<String>,
    pub experience_years: Option<u32>,
    pub hospital_name: Option<String>,
    pub consultation_fee: Option<Decimal>,
}

/// One page of the public doctor listing.
#[derive(Clone, Debug, Serialize)]
pub struct DoctorPage {
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub doctors: Vec<DoctorProfile>,
}

/// Directory service over the doctors collection.
#[derive(Clone)]
pub struct DoctorDirectory {
    store: Arc<ClinicStore>,
}

impl DoctorDirectory {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Create the profile for a doctor account. One profile per account,
    /// enforced by the `doctors_by_user` index inside a transaction.
    ///
    /// The new profile starts `pending`; an admin must approve it before the
    /// doctor becomes visible or bookable.
    pub fn create_profile(
        &self,
        principal: &Principal,
        new: NewDoctorProfile,
    ) -> ClinicResult<DoctorProfile> {
        if principal.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }
        if new.specialization.trim().is_empty() || new.hospital_name.trim().is_empty() {
            return Err(ClinicError::Validation(
                "specialization and hospital name are required".into(),
            ));
        }
        if new.consultation_fee < Decimal::ZERO {
            return Err(ClinicError::Validation(
                "consultation fee cannot be negative".into(),
            ));
        }

        let now = Utc::now();
        let profile = DoctorProfile {
            id: Uuid::new_v4(),
            user_id: principal.id,
            specialization: new.specialization.trim().to_lowercase(),
            experience_years: new.experience_years,
            hospital_name: new.hospital_name.trim().to_owned(),
            consultation_fee: new.consultation_fee,
            status: DoctorStatus::Pending,
            is_active: true,
            rating: 0.0,
            num_reviews: 0,
            created_at: now,
            updated_at: now,
        };
        let doc = store::encode_doc(&profile)?;

        (self.store.doctors(), self.store.doctors_by_user())
            .transaction(|(doctors, by_user)| {
                if by_user.get(profile.user_id.as_bytes())?.is_some() {
                    return Err(ConflictableTransactionError::Abort(
                        ClinicError::AlreadyExists("doctor profile"),
                    ));
                }
                by_user.insert(profile.user_id.as_bytes(), profile.id.as_bytes())?;
                doctors.insert(profile.id.as_bytes(), doc.as_slice())?;
                Ok(())
            })
            .map_err(ClinicError::from)?;

        tracing::info!(doctor = %profile.id, "doctor profile created, awaiting approval");
        Ok(profile)
    }

    /// The calling doctor's own profile.
    pub fn my_profile(&self, principal: &Principal) -> ClinicResult<DoctorProfile> {
        if principal.role != Role::Doctor {
            return Err(ClinicError::Forbidden);
        }
        self.profile_for_user(principal.id)
    }

    /// Update the calling doctor's own profile.
    ///
    /// Any change resets the approval status to `pending`: an admin must
    /// re-approve before the doctor is bookable again.
    pub fn update_my_profile(
        &self,
        principal: &Principal,
        update: DoctorProfileUpdate,
    ) -> ClinicResult<DoctorProfile> {
        let mut profile = self.my_profile(principal)?;

        if let Some(specialization) = update.specialization {
            if specialization.trim().is_empty() {
                return Err(ClinicError::Validation(
                    "specialization cannot be empty".into(),
                ));
            }
            profile.specialization = specialization.trim().to_lowercase();
        }
        if let Some(years) = update.experience_years {
            profile.experience_years = years;
        }
        if let Some(hospital_name) = update.hospital_name {
            if hospital_name.trim().is_empty() {
                return Err(ClinicError::Validation("hospital name cannot be empty".into()));
            }
            profile.hospital_name = hospital_name.trim().to_owned();
        }
        if let Some(fee) = update.consultation_fee {
            if fee < Decimal::ZERO {
                return Err(ClinicError::Validation(
                    "consultation fee cannot be negative".into(),
                ));
            }
            profile.consultation_fee = fee;
        }

        profile.status = DoctorStatus::Pending;
        profile.updated_at = Utc::now();
        store::put_doc(self.store.doctors(), profile.id.as_bytes(), &profile)?;
        Ok(profile)
    }

    /// Public listing: approved, active doctors, optionally filtered by a
    /// case-insensitive substring of the specialization, ordered by
    /// specialization then id for a stable pagination.
    pub fn list_approved(
        &self,
        page: usize,
        limit: usize,
        search: Option<&str>,
    ) -> ClinicResult<DoctorPage> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let needle = search.map(str::to_lowercase).unwrap_or_default();

        let mut doctors: Vec<DoctorProfile> = store::scan_docs(self.store.doctors())?;
        doctors.retain(|d| d.is_bookable() && d.specialization.contains(&needle));
        doctors.sort_by(|a, b| {
            a.specialization
                .cmp(&b.specialization)
                .then(a.id.cmp(&b.id))
        });

        let total = doctors.len();
        let total_pages = total.div_ceil(limit);
        let doctors = doctors
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();

        Ok(DoctorPage {
            total,
            page,
            total_pages,
            doctors,
        })
    }

    /// Fetch a doctor by id for public viewing; hidden unless approved and
    /// active.
    pub fn get_approved(&self, id: Uuid) -> ClinicResult<DoctorProfile> {
        let profile = self.get(id)?;
        if !profile.is_bookable() {
            return Err(ClinicError::NotFound("doctor"));
        }
        Ok(profile)
    }

    /// Admin: approve a pending or suspended doctor.
    pub fn approve(&self, principal: &Principal, id: Uuid) -> ClinicResult<DoctorProfile> {
        self.set_status(principal, id, DoctorStatus::Approved)
    }

    /// Admin: suspend a doctor; they disappear from the listing and cannot be
    /// booked until re-approved.
    pub fn suspend(&self, principal: &Principal, id: Uuid) -> ClinicResult<DoctorProfile> {
        self.set_status(principal, id, DoctorStatus::Suspended)
    }

    /// Admin: deactivate a doctor entirely (soft delete).
    pub fn deactivate(&self, principal: &Principal, id: Uuid) -> ClinicResult<DoctorProfile> {
        require_admin(principal)?;
        let mut profile = self.get(id)?;
        profile.is_active = false;
        profile.updated_at = Utc::now();
        store::put_doc(self.store.doctors(), profile.id.as_bytes(), &profile)?;
        tracing::info!(doctor = %profile.id, "doctor deactivated");
        Ok(profile)
    }

    /// Admin: profiles awaiting approval.
    pub fn pending(&self, principal: &Principal) -> ClinicResult<Vec<DoctorProfile>> {
        require_admin(principal)?;
        let mut doctors: Vec<DoctorProfile> = store::scan_docs(self.store.doctors())?;
        doctors.retain(|d| d.status == DoctorStatus::Pending);
        doctors.sort_by_key(|d| d.created_at);
        Ok(doctors)
    }

    /// Fetch any profile by id, regardless of approval state.
    pub(crate) fn get(&self, id: Uuid) -> ClinicResult<DoctorProfile> {
        store::get_doc(self.store.doctors(), id.as_bytes())?.ok_or(ClinicError::NotFound("doctor"))
    }

    /// Resolve the profile owned by a user account.
    pub(crate) fn profile_for_user(&self, user_id: Uuid) -> ClinicResult<DoctorProfile> {
        let id = self
            .store
            .doctors_by_user()
            .get(user_id.as_bytes())?
            .ok_or(ClinicError::NotFound("doctor profile"))?;
        store::get_doc(self.store.doctors(), &id)?.ok_or(ClinicError::NotFound("doctor profile"))
    }

    fn set_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: DoctorStatus,
    ) -> ClinicResult<DoctorProfile> {
        require_admin(principal)?;
        let mut profile = self.get(id)?;
        profile.status = status;
        profile.updated_at = Utc::now();
        store::put_doc(self.store.doctors(), profile.id.as_bytes(), &profile)?;
        tracing::info!(doctor = %profile.id, status = ?status, "doctor status changed");
        Ok(profile)
    }
}
