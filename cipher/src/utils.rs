// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use base64::{Engine as _, prelude::BASE64_STANDARD};

#[inline]
pub fn base64_encode(input: &[u8]) -> String {
    BASE64_STANDARD.encode(input)
}

#[inline]
pub fn base64_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_STANDARD.decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_decode() {
        let actual = base64_decode("SGVsbG8=").unwrap();
        assert_eq!(actual, b"Hello");
    }

    #[test]
    fn test_base64_decode_empty() {
        assert!(base64_decode("").unwrap().is_empty());
        assert_eq!(base64_encode(&[]), "");
    }

    #[test]
    fn test_base64_decode_rejects_garbage() {
        assert!(base64_decode("not base64!").is_err());
    }
}
