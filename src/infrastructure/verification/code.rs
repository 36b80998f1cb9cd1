//! Verification code generation

use rand::rngs::OsRng;
use rand::Rng;

use crate::domain::verification::CODE_LENGTH;

/// Six decimal digits, each drawn independently from the OS CSPRNG
pub fn generate_code() -> String {
    let mut rng = OsRng;

    (0..CODE_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
