use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use secrecy::{ExposeSecret, Secret};
use telemetry::spawn_blocking_with_tracing;

// Verified against when the username is unknown, so both paths cost the same.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=15000,t=2,p=1$\
    gZiV/M1gPc22ElAH/Jh1Hw$\
    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno";

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

pub struct Credentials {
    pub username: String,
    pub password: Secret<String>,
}

/// The single administrator account, as configured.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: Secret<String>,
}

#[tracing::instrument(name = "Validate credentials", skip(credentials, admin))]
pub async fn validate_credentials(
    credentials: Credentials,
    admin: &AdminCredentials,
) -> Result<String, AuthError> {
    let mut user_id = None;
    let mut expected_password_hash = Secret::new(DUMMY_PASSWORD_HASH.to_string());

    if credentials.username == admin.username {
        if PasswordHash::new(admin.password_hash.expose_secret()).is_ok() {
            user_id = Some(admin.username.clone());
            expected_password_hash = admin.password_hash.clone();
        } else {
            tracing::warn!("The admin password hash is not a valid PHC string, login is disabled");
        }
    }

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;

    user_id
        .ok_or_else(|| anyhow::anyhow!("Unknown username."))
        .map_err(AuthError::InvalidCredentials)
}

#[tracing::instrument(
    name = "Validate credentials",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)
}

pub fn compute_password_hash(password: Secret<String>) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).context("Invalid argon2 parameters.")?,
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)
    .context("Failed to hash the password.")?
    .to_string();
    Ok(Secret::new(password_hash))
}
