//! Decoding of the `find` request parameters.

use percent_encoding::percent_decode_str;
use poolwatch_core::AppError;

/// Extract the requested block hashes from a form-encoded query or body.
///
/// Hashes come either as repeated `block=` keys or in array form as
/// `block[]=`. If both are present the scalar form wins. Blank values are
/// ignored.
pub fn requested_blocks(encoded: &[u8]) -> Result<Vec<String>, AppError> {
    let encoded = std::str::from_utf8(encoded)
        .map_err(|_| AppError::BadRequest("form data is not valid UTF-8".into()))?;

    let mut scalar = Vec::new();
    let mut array = Vec::new();

    for pair in encoded.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            "block" => scalar.push(value),
            "block[]" => array.push(value),
            _ => {}
        }
    }

    Ok(if scalar.is_empty() { array } else { scalar })
}

/// Decode one form component: `+` is a space, `%XX` escapes must form UTF-8.
fn decode_component(raw: &str) -> Result<String, AppError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AppError::BadRequest("percent-escapes do not decode to UTF-8".into()))
}
