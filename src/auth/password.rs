//! Password strength checks and bcrypt hashing.

use std::fmt::{self, Display};

use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that passed the strength check but is not hashed yet.
///
/// Turn it into a [PasswordHash] before storing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check `raw_password` is strong enough to use.
    ///
    /// `user_inputs` are strings the password should not be guessable from,
    /// such as the user's email address.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with zxcvbn's advice on how to make the
    /// password stronger.
    pub fn new(raw_password: &str, user_inputs: &[&str]) -> Result<Self, Error> {
        let estimate = zxcvbn(raw_password, user_inputs);

        if matches!(estimate.score(), Score::Three | Score::Four) {
            return Ok(Self(raw_password.to_owned()));
        }

        let advice = estimate
            .feedback()
            .map(Feedback::to_string)
            .unwrap_or_default();

        Err(Error::TooWeak(advice))
    }

    /// Skip the strength check, e.g. for test fixtures.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("********")
    }
}

/// A salted bcrypt hash of a password.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// bcrypt's recommended cost.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds. Tests use a low cost to stay fast.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read from the database.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Whether `raw_password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn verify(&self, raw_password: &str) -> Result<bool, Error> {
        bcrypt::verify(raw_password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        auth::{PasswordHash, ValidatedPassword},
    };

    #[test]
    fn weak_passwords_are_rejected_with_advice() {
        for password in ["", "password", "imtooshort"] {
            let result = ValidatedPassword::new(password, &[]);

            assert!(
                matches!(result, Err(Error::TooWeak(_))),
                "want {password:?} rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn password_made_from_email_is_rejected() {
        let result = ValidatedPassword::new("alice@example.com", &["alice@example.com"]);

        assert!(matches!(result, Err(Error::TooWeak(_))));
    }

    #[test]
    fn long_passphrase_is_accepted() {
        let result = ValidatedPassword::new("correct horse battery staple ledger", &[]);

        assert!(result.is_ok());
    }

    #[test]
    fn validated_password_is_masked_when_displayed() {
        let password = ValidatedPassword::new_unchecked("hunter2hunter2");

        assert_eq!(password.to_string(), "********");
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash =
            PasswordHash::new(ValidatedPassword::new_unchecked("averysafeandsecurepassword"), 4)
                .unwrap();

        assert!(hash.verify("averysafeandsecurepassword").unwrap());
        assert!(!hash.verify("averysafeandsecurepassworD").unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let password = ValidatedPassword::new_unchecked("averysafeandsecurepassword");

        let first = PasswordHash::new(password.clone(), 4).unwrap();
        let second = PasswordHash::new(password, 4).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        assert!(matches!(hash.verify("anything"), Err(Error::HashingError(_))));
    }
}
