//! Email verification tokens.

mod service;
pub mod token;

pub use service::{
    IssuedToken, ResendOutcome, VerificationService, VerifiedEmail, RESEND_MESSAGE,
    VERIFIED_MESSAGE,
};
