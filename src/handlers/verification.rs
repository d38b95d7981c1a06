//! One-time codes: the benefit-claim dispatch and the global admin code.
//!
//! Claim codes are dispatch-only. The member and the partner company each
//! receive the same code and compare it in person; nothing is stored and the
//! server never checks a claim code afterwards.

use crate::errors::ApiError;
use crate::handlers::whatsapp::{MessagingError, Messenger};
use crate::store::{Store, StoreError};
use log::{error, info, warn};
use rand::Rng;
use serde::Serialize;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const CODE_RANGE: RangeInclusive<u32> = 100_000..=999_999;

pub fn generate_code() -> String {
    generate_code_with(&mut rand::rng())
}

pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.random_range(CODE_RANGE).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Member,
    Partner,
}

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Member not found")]
    MemberNotFound,

    #[error("Member phone number is missing")]
    MemberPhoneMissing,

    #[error("Benefit not found")]
    BenefitNotFound,

    #[error("Company phone number is missing")]
    PartnerPhoneMissing,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A dispatch failed. `notified` lists the parties that already received
    /// the code; the claim as a whole is failed and a retry issues a new code.
    #[error("Failed to send verification code to the {failed:?}")]
    Dispatch {
        failed: Party,
        notified: Vec<Party>,
        #[source]
        source: MessagingError,
    },
}

impl From<ClaimError> for ApiError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::MemberNotFound | ClaimError::BenefitNotFound => {
                ApiError::NotFound(e.to_string())
            }
            ClaimError::MemberPhoneMissing | ClaimError::PartnerPhoneMissing => {
                ApiError::Validation(e.to_string())
            }
            ClaimError::Store(inner) => inner.into(),
            ClaimError::Dispatch {
                failed, notified, ..
            } => {
                let message = if notified.is_empty() {
                    "Failed to send the verification code; no party was notified. \
                     Retry the claim to receive a new code"
                        .to_string()
                } else {
                    format!(
                        "Failed to send the verification code to the {}; the {} already \
                         received it. Retry the claim to receive a new code",
                        party_name(failed),
                        notified
                            .iter()
                            .map(|p| party_name(*p))
                            .collect::<Vec<_>>()
                            .join(" and ")
                    )
                };
                ApiError::Dependency(message)
            }
        }
    }
}

fn party_name(party: Party) -> &'static str {
    match party {
        Party::Member => "member",
        Party::Partner => "partner company",
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimDispatch {
    pub benefit_id: i32,
    pub company_name: String,
    pub notified: Vec<Party>,
}

/// Sends a fresh claim code to the member and to the partner company.
///
/// Every lookup and precondition runs before the code is generated, so a
/// missing member, benefit or phone number never results in a message.
pub async fn dispatch_claim_code(
    store: &dyn Store,
    messenger: &dyn Messenger,
    matricula: &str,
    benefit_id: i32,
) -> Result<ClaimDispatch, ClaimError> {
    let member = store
        .find_member(matricula)
        .await?
        .ok_or(ClaimError::MemberNotFound)?;

    let partnership = store
        .find_partnership(benefit_id)
        .await?
        .ok_or(ClaimError::BenefitNotFound)?;

    let partner_phone = partnership
        .phone_number
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ClaimError::PartnerPhoneMissing)?;

    let member_phone = member
        .phone_number
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or(ClaimError::MemberPhoneMissing)?;

    let code = generate_code();
    info!(
        "Dispatching claim code for member {} and benefit {} ({})",
        member.matricula, partnership.id, partnership.company_name
    );

    let mut notified = Vec::with_capacity(2);

    messenger
        .send_code(member_phone, &code, &partnership.company_name)
        .await
        .map_err(|source| {
            error!(
                "Claim code dispatch to member {} failed: {}",
                member.matricula, source
            );
            ClaimError::Dispatch {
                failed: Party::Member,
                notified: notified.clone(),
                source,
            }
        })?;
    notified.push(Party::Member);

    if let Err(source) = messenger
        .send_code(partner_phone, &code, &member.username)
        .await
    {
        warn!(
            "Claim code for member {} reached the member but not partner {}: {}",
            member.matricula, partnership.id, source
        );
        return Err(ClaimError::Dispatch {
            failed: Party::Partner,
            notified,
            source,
        });
    }
    notified.push(Party::Partner);

    Ok(ClaimDispatch {
        benefit_id: partnership.id,
        company_name: partnership.company_name,
        notified,
    })
}

#[derive(Debug, Error)]
pub enum CodeCheckError {
    #[error("Verification code is required")]
    Missing,

    #[error("No verification code has been set")]
    NotSet,

    #[error("Incorrect verification code")]
    Mismatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CodeCheckError> for ApiError {
    fn from(e: CodeCheckError) -> Self {
        match e {
            CodeCheckError::Missing | CodeCheckError::NotSet | CodeCheckError::Mismatch => {
                ApiError::Validation(e.to_string())
            }
            CodeCheckError::Store(inner) => inner.into(),
        }
    }
}

/// Replaces the global admin code, creating it on first use.
pub async fn set_admin_code(store: &dyn Store, code: &str) -> Result<(), CodeCheckError> {
    if code.trim().is_empty() {
        return Err(CodeCheckError::Missing);
    }
    store.upsert_admin_code(code).await?;
    info!("Admin verification code updated");
    Ok(())
}

/// Compares `submitted` with the global admin code (exact match) and marks
/// the member as verified. The code stays valid after use.
pub async fn verify_admin_code(
    store: &dyn Store,
    matricula: &str,
    submitted: &str,
) -> Result<(), CodeCheckError> {
    if submitted.is_empty() {
        return Err(CodeCheckError::Missing);
    }

    let stored = store.admin_code().await?.ok_or(CodeCheckError::NotSet)?;
    if stored.code != submitted {
        return Err(CodeCheckError::Mismatch);
    }

    if !store.mark_member_verified(matricula).await? {
        warn!(
            "Member {} submitted a valid code but has no member record",
            matricula
        );
    }
    Ok(())
}
