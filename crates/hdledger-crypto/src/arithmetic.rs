//! Scalar and point arithmetic on the Ed25519 group.
//!
//! All scalars are little-endian 32-byte encodings reduced modulo the group
//! order `l`; all points are 32-byte compressed Edwards-y encodings. Every
//! function validates its input lengths and never returns an unreduced
//! scalar or an off-curve point.

use crate::error::{CryptoError, Result};
use curve25519_dalek::{
    constants::ED25519_BASEPOINT_TABLE,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};

/// Length of an encoded scalar.
pub const SCALAR_LEN: usize = 32;
/// Length of a compressed point.
pub const POINT_LEN: usize = 32;

/// Reduce an integer modulo the group order.
///
/// Accepts a 64-byte wide integer, or a 32-byte integer which is treated as
/// zero-extended to 64 bytes.
pub fn reduce(bytes: &[u8]) -> Result<[u8; 32]> {
    let mut wide = [0u8; 64];
    match bytes.len() {
        32 | 64 => wide[..bytes.len()].copy_from_slice(bytes),
        n => {
            return Err(CryptoError::Arithmetic(format!(
                "reduce expects 32 or 64 bytes, got {}",
                n
            )))
        }
    }
    Ok(Scalar::from_bytes_mod_order_wide(&wide).to_bytes())
}

/// Multiply the base point by a reduced scalar.
pub fn scalar_mult_base(scalar: &[u8]) -> Result<[u8; 32]> {
    let scalar = canonical_scalar(scalar)?;
    Ok(base_mul(&scalar))
}

/// Add two scalars byte-wise with carry over 32 bytes, then reduce the raw sum.
pub fn add_scalars(a: &[u8], b: &[u8]) -> Result<[u8; 32]> {
    let a = fixed::<SCALAR_LEN>(a, "scalar")?;
    let b = fixed::<SCALAR_LEN>(b, "scalar")?;

    let mut sum = [0u8; 32];
    let mut carry = 0u16;
    for i in 0..SCALAR_LEN {
        let v = a[i] as u16 + b[i] as u16 + carry;
        sum[i] = v as u8;
        carry = v >> 8;
    }

    reduce(&sum)
}

/// Add two curve points.
pub fn add_points(p: &[u8], q: &[u8]) -> Result<[u8; 32]> {
    let p = decompress(p)?;
    let q = decompress(q)?;
    Ok((p + q).compress().to_bytes())
}

/// Decode a compressed point, rejecting encodings that are not on the curve.
pub fn decompress(point: &[u8]) -> Result<EdwardsPoint> {
    let bytes = fixed::<POINT_LEN>(point, "point")?;
    CompressedEdwardsY(bytes)
        .decompress()
        .ok_or_else(|| CryptoError::Arithmetic("point is not on the curve".to_string()))
}

/// Decode a scalar, rejecting encodings that are not reduced.
pub fn canonical_scalar(scalar: &[u8]) -> Result<Scalar> {
    let bytes = fixed::<SCALAR_LEN>(scalar, "scalar")?;
    Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))
        .ok_or_else(|| CryptoError::Arithmetic("scalar is not reduced".to_string()))
}

fn base_mul(scalar: &Scalar) -> [u8; 32] {
    (ED25519_BASEPOINT_TABLE * scalar).compress().to_bytes()
}

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        CryptoError::Arithmetic(format!("{} must be {} bytes, got {}", what, N, bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;

    // l = 2^252 + 27742317777372353535851937790883648493, little-endian
    const ORDER: [u8; 32] = [
        0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xde, 0xf9, 0xde,
        0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x10,
    ];

    fn scalar(n: u64) -> [u8; 32] {
        Scalar::from(n).to_bytes()
    }

    #[test]
    fn test_reduce_order_is_zero() {
        assert_eq!(reduce(&ORDER).unwrap(), [0u8; 32]);

        let mut wide = [0u8; 64];
        wide[..32].copy_from_slice(&ORDER);
        assert_eq!(reduce(&wide).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_reduce_small_value_unchanged() {
        assert_eq!(reduce(&scalar(12345)).unwrap(), scalar(12345));
    }

    #[test]
    fn test_reduce_rejects_bad_length() {
        assert!(matches!(reduce(&[0u8; 31]), Err(CryptoError::Arithmetic(_))));
        assert!(matches!(reduce(&[0u8; 65]), Err(CryptoError::Arithmetic(_))));
    }

    #[test]
    fn test_scalar_mult_base_one_is_basepoint() {
        let one = scalar(1);
        assert_eq!(
            scalar_mult_base(&one).unwrap(),
            ED25519_BASEPOINT_POINT.compress().to_bytes()
        );
    }

    #[test]
    fn test_scalar_mult_base_rejects_unreduced() {
        assert!(scalar_mult_base(&ORDER).is_err());
        assert!(scalar_mult_base(&[0xff; 32]).is_err());
        assert!(scalar_mult_base(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_add_scalars_carries() {
        let mut a = [0u8; 32];
        a[0] = 0xff;
        let mut b = [0u8; 32];
        b[0] = 0x01;
        let mut expected = [0u8; 32];
        expected[1] = 0x01;
        assert_eq!(add_scalars(&a, &b).unwrap(), expected);
    }

    #[test]
    fn test_add_scalars_wraps_at_order() {
        // (l - 1) + 2 == 1 mod l
        let mut l_minus_one = ORDER;
        l_minus_one[0] -= 1;
        assert_eq!(add_scalars(&l_minus_one, &scalar(2)).unwrap(), scalar(1));
    }

    #[test]
    fn test_add_points_matches_scalar_addition() {
        let a = scalar(7);
        let b = scalar(35);
        let sum = add_points(
            &scalar_mult_base(&a).unwrap(),
            &scalar_mult_base(&b).unwrap(),
        )
        .unwrap();
        assert_eq!(sum, scalar_mult_base(&scalar(42)).unwrap());
    }

    #[test]
    fn test_add_points_rejects_bad_input() {
        let p = scalar_mult_base(&scalar(3)).unwrap();
        assert!(add_points(&p, &[0u8; 31]).is_err());
        // y = 2 has no matching x on the curve
        let mut off_curve = [0u8; 32];
        off_curve[0] = 2;
        assert!(add_points(&p, &off_curve).is_err());
    }
}
