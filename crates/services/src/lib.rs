//! Application services: the transactional use cases behind the HTTP API.
//!
//! Each service owns `Arc` handles to the credential store (and sequence
//! generator where numbers are minted) and takes the current time explicitly.

pub mod authenticator;
pub mod billing;
pub mod error;
pub mod inputs;
pub mod numbering;
pub mod provisioner;
pub mod users;

mod support;

pub use authenticator::{AuthService, LoginResult};
pub use billing::{ApprovedPayment, BillingService};
pub use error::{ServiceError, ServiceResult};
pub use inputs::{
    CreateMemberInput, LoginInput, RegisterApplicantInput, SubmitPaymentInput,
    SubmitRegistrationInput, UpdateStatusInput, UpdateTierInput,
};
pub use numbering::{IssuedNumber, NumberingService};
pub use provisioner::{Credentials, Provisioner, StatusUpdate};
pub use support::TRANSACTION_ATTEMPTS;
pub use users::{CreatedMember, MemberService};
