//! Pedersen generators
//!
//! ```text
//! G = Ristretto basepoint
//! H = hash_to_group(SHA-512, "zkfund.pedersen.H.v1")
//! ```
//!
//! `H` comes from hashing to the group, so no party knows `log_G(H)`.

use std::sync::OnceLock;

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use rand::{CryptoRng, RngCore};
use sha2::Sha512;
use zeroize::Zeroizing;

const BLINDING_GENERATOR_LABEL: &[u8] = b"zkfund.pedersen.H.v1";

static GENS: OnceLock<PedersenGens> = OnceLock::new();

#[derive(Debug, Clone, Copy)]
pub struct PedersenGens {
    /// Value generator
    pub g: RistrettoPoint,
    /// Blinding generator
    pub h: RistrettoPoint,
}

impl PedersenGens {
    /// C = value·G + blinding·H
    pub fn commit(&self, value: Scalar, blinding: Scalar) -> RistrettoPoint {
        self.g * value + self.h * blinding
    }
}

/// Process-wide generator pair.
pub fn pedersen_gens() -> &'static PedersenGens {
    GENS.get_or_init(|| PedersenGens {
        g: RISTRETTO_BASEPOINT_POINT,
        h: RistrettoPoint::hash_from_bytes::<Sha512>(BLINDING_GENERATOR_LABEL),
    })
}

/// Uniform scalar from 64 bytes of entropy (full width, reduced mod ℓ).
pub(crate) fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut wide = Zeroizing::new([0u8; 64]);
    rng.fill_bytes(&mut *wide);
    Scalar::from_bytes_mod_order_wide(&wide)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_are_distinct_and_stable() {
        let gens = pedersen_gens();
        assert_ne!(gens.g, gens.h);
        assert_eq!(
            gens.h,
            RistrettoPoint::hash_from_bytes::<Sha512>(BLINDING_GENERATOR_LABEL)
        );
    }

    #[test]
    fn commitment_is_additively_homomorphic() {
        let gens = pedersen_gens();
        let (a, ra) = (Scalar::from(3u64), Scalar::from(11u64));
        let (b, rb) = (Scalar::from(4u64), Scalar::from(13u64));
        assert_eq!(
            gens.commit(a, ra) + gens.commit(b, rb),
            gens.commit(a + b, ra + rb)
        );
    }
}
