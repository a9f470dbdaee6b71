use actioncodes_core::error::ProtocolError;

/// Read the first `ceil(nbits / 8)` bytes of `bytes` as a big-endian integer
/// and mask it down to `nbits` bits.
pub fn truncate_bits(bytes: &[u8], nbits: u32) -> Result<u128, ProtocolError> {
    if nbits == 0 || nbits > 128 {
        return Err(ProtocolError::InvalidDigest(format!(
            "cannot truncate to {nbits} bits"
        )));
    }
    let needed = nbits.div_ceil(8) as usize;
    if bytes.len() < needed {
        return Err(ProtocolError::InvalidDigest(format!(
            "digest too short: {} bytes, need {needed}",
            bytes.len()
        )));
    }
    let mut value: u128 = 0;
    for &b in &bytes[..needed] {
        value = (value << 8) | u128::from(b);
    }
    let mask = if nbits == 128 {
        u128::MAX
    } else {
        (1u128 << nbits) - 1
    };
    Ok(value & mask)
}

/// Map a digest to an `n`-digit decimal string: interpret the digest as an
/// unsigned big-endian integer, reduce modulo `10^n`, left-pad with zeros.
///
/// The reduction walks every byte unconditionally and the padding is done by
/// the formatter, so nothing here branches on a digit's value.
pub fn digits_from_digest(digest: &[u8], n: usize) -> Result<String, ProtocolError> {
    if n == 0 || n > 24 {
        return Err(ProtocolError::InvalidDigest(format!(
            "cannot derive {n} digits from a digest"
        )));
    }
    if digest.is_empty() {
        return Err(ProtocolError::InvalidDigest("empty digest".into()));
    }
    // 10^24 < 2^80, so the running remainder times 256 stays within u128.
    let modulus = 10u128.pow(n as u32);
    let mut rem: u128 = 0;
    for &b in digest {
        rem = ((rem << 8) | u128::from(b)) % modulus;
    }
    Ok(format!("{rem:0width$}", width = n))
}
