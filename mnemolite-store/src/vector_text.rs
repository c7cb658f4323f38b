//! The vector/string boundary convention: `"[v1,v2,...]"` in, `Vec<f32>`
//! out. This module is the only place in the crate allowed to parse or
//! produce that literal form — every other module that needs a vector on
//! the wire calls through here instead of formatting floats itself.

use mnemolite_common::CoreError;

pub fn encode(vector: &[f32]) -> String {
    let mut out = String::with_capacity(2 + vector.len() * 8);
    out.push('[');
    for (i, v) in vector.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&v.to_string());
    }
    out.push(']');
    out
}

pub fn decode(text: &str) -> Result<Vec<f32>, CoreError> {
    let inner = text
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| CoreError::invalid_input(format!("malformed vector literal: {text}")))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| CoreError::invalid_input(format!("malformed vector component `{part}`: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_vector() {
        let v = vec![0.5, -1.25, 3.0];
        let text = encode(&v);
        assert_eq!(text, "[0.5,-1.25,3]");
        assert_eq!(decode(&text).unwrap(), v);
    }

    #[test]
    fn rejects_missing_brackets() {
        assert!(decode("0.5,1.0").is_err());
    }

    #[test]
    fn empty_vector_round_trips() {
        assert_eq!(encode(&[]), "[]");
        assert_eq!(decode("[]").unwrap(), Vec::<f32>::new());
    }
}
