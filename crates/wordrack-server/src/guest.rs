//! Guest account provisioning collaborator.
//!
//! `GuestProvisioner` is the contract: no input in, a fresh guest
//! identity and a time-limited sign-in token out. `LocalProvisioner` is
//! the reference implementation; a deployment backed by an external
//! identity provider implements the same trait.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Sign-in token lifetime: 7 days.
pub const TOKEN_EXPIRY: Duration = Duration::from_secs(604_800);

const ADJECTIVES: [&str; 10] = [
    "Swift", "Clever", "Brave", "Lucky", "Mighty", "Quick", "Bright", "Calm", "Bold", "Witty",
];

const ANIMALS: [&str; 10] = [
    "Fox", "Hawk", "Bear", "Wolf", "Lion", "Tiger", "Eagle", "Otter", "Owl", "Shark",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Failed to create guest user")]
pub struct ProvisioningError;

/// A freshly provisioned guest account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentity {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// A guest identity plus its time-limited sign-in token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestSignIn {
    pub identity: GuestIdentity,
    pub token: String,
    pub expires_in: Duration,
}

pub trait GuestProvisioner {
    fn provision(&self) -> Result<GuestSignIn, ProvisioningError>;
}

/// Generate a guest display name like `SwiftFox1234`.
pub fn generate_guest_name<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).unwrap_or(&ADJECTIVES[0]);
    let animal = ANIMALS.choose(rng).unwrap_or(&ANIMALS[0]);
    let number: u32 = rng.gen_range(1000..10000);
    format!("{adjective}{animal}{number}")
}

/// Derive the guest's placeholder email address from its name.
pub fn guest_email(name: &str) -> String {
    format!("{}@guest.wordrack.example", name.to_lowercase())
}

/// Provisions guest identities locally, with no external provider.
pub struct LocalProvisioner;

impl GuestProvisioner for LocalProvisioner {
    fn provision(&self) -> Result<GuestSignIn, ProvisioningError> {
        let mut rng = rand::thread_rng();
        let username = generate_guest_name(&mut rng);
        let email = guest_email(&username);

        Ok(GuestSignIn {
            identity: GuestIdentity {
                user_id: format!("guest_{}", Uuid::new_v4().simple()),
                username,
                email,
            },
            token: Uuid::new_v4().simple().to_string(),
            expires_in: TOKEN_EXPIRY,
        })
    }
}
