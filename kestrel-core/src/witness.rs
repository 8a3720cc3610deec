//! Witnesses: input values laid out public first, then secret.
//!
//! Binary layout: `nb_public: u32`, `nb_secret: u32`, then every element in canonical
//! compressed form. The JSON form is an object mapping input names to decimal strings, in
//! the order given by the circuit [`Schema`]; a public-only witness carries only public names.

use std::io::{Read, Write};

use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use num_bigint::{BigInt, BigUint};
use serde_json::{Map, Value};

use crate::frontend::{Assignment, Schema};
use crate::utils::io::{CountingReader, CountingWriter};
use crate::utils::math::{bigint_to_field, field_to_biguint, modulus};

#[derive(Debug, thiserror::Error)]
pub enum WitnessError {
    /// A schema input has no value
    #[error("no value for input {0:?}")]
    MissingValue(String),

    /// A value was provided for a name the schema does not know
    #[error("unknown input {0:?}")]
    UnknownInput(String),

    /// A value could not be parsed as an integer below the field modulus
    #[error("invalid value for input {name:?}: {value}")]
    InvalidValue { name: String, value: String },

    /// Element counts do not match the schema
    #[error("witness has {public} public and {secret} secret values, schema expects {expected_public} and {expected_secret}")]
    Shape {
        public: usize,
        secret: usize,
        expected_public: usize,
        expected_secret: usize,
    },

    #[error("json witness must be an object")]
    NotAnObject,

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Witness<F: PrimeField> {
    public: Vec<F>,
    secret: Vec<F>,
}

impl<F: PrimeField> Witness<F> {
    pub fn new(public: Vec<F>, secret: Vec<F>) -> Self {
        Self { public, secret }
    }

    /// Lays out `assignment` according to `schema`, reducing every value into the field.
    pub fn from_assignment(schema: &Schema, assignment: &Assignment) -> Result<Self, WitnessError> {
        if let Some((name, _)) = assignment
            .iter()
            .find(|(name, _)| schema.visibility(name).is_none())
        {
            return Err(WitnessError::UnknownInput(name.to_string()));
        }
        let lookup = |names: &[String]| -> Result<Vec<F>, WitnessError> {
            names
                .iter()
                .map(|name| {
                    assignment
                        .get(name)
                        .map(bigint_to_field::<F>)
                        .ok_or_else(|| WitnessError::MissingValue(name.clone()))
                })
                .collect()
        };
        Ok(Self {
            public: lookup(&schema.public)?,
            secret: lookup(&schema.secret)?,
        })
    }

    pub fn public(&self) -> &[F] {
        &self.public
    }

    pub fn secret(&self) -> &[F] {
        &self.secret
    }

    /// The public part alone, as handed to a verifier.
    pub fn public_only(&self) -> Self {
        Self {
            public: self.public.clone(),
            secret: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.public.len() + self.secret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the binary form and returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<u64, WitnessError> {
        let mut writer = CountingWriter::new(writer);
        (self.public.len() as u32).serialize_compressed(&mut writer)?;
        (self.secret.len() as u32).serialize_compressed(&mut writer)?;
        for value in self.public.iter().chain(&self.secret) {
            value.serialize_compressed(&mut writer)?;
        }
        Ok(writer.bytes_written())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<(Self, u64), WitnessError> {
        let mut reader = CountingReader::new(reader);
        let nb_public = u32::deserialize_compressed(&mut reader)? as usize;
        let nb_secret = u32::deserialize_compressed(&mut reader)? as usize;
        let mut read = |n: usize| -> Result<Vec<F>, WitnessError> {
            (0..n)
                .map(|_| F::deserialize_compressed(&mut reader).map_err(WitnessError::from))
                .collect()
        };
        let public = read(nb_public)?;
        let secret = read(nb_secret)?;
        Ok((Self { public, secret }, reader.bytes_read()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WitnessError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    fn check_shape(&self, schema: &Schema) -> Result<(), WitnessError> {
        let secret_ok = self.secret.is_empty() || self.secret.len() == schema.nb_secret();
        if self.public.len() != schema.nb_public() || !secret_ok {
            return Err(WitnessError::Shape {
                public: self.public.len(),
                secret: self.secret.len(),
                expected_public: schema.nb_public(),
                expected_secret: schema.nb_secret(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self, schema: &Schema) -> Result<Value, WitnessError> {
        self.check_shape(schema)?;
        let mut object = Map::new();
        for (name, value) in schema.public.iter().zip(&self.public) {
            object.insert(name.clone(), Value::String(field_to_biguint(value).to_string()));
        }
        for (name, value) in schema.secret.iter().zip(&self.secret) {
            object.insert(name.clone(), Value::String(field_to_biguint(value).to_string()));
        }
        Ok(Value::Object(object))
    }

    pub fn to_json_string(&self, schema: &Schema) -> Result<String, WitnessError> {
        Ok(serde_json::to_string(&self.to_json(schema)?)?)
    }

    /// Parses a JSON witness. If none of the secret names are present the result is a
    /// public-only witness.
    pub fn from_json(schema: &Schema, json: &Value) -> Result<Self, WitnessError> {
        let object = json.as_object().ok_or(WitnessError::NotAnObject)?;
        if let Some(name) = object.keys().find(|k| schema.visibility(k).is_none()) {
            return Err(WitnessError::UnknownInput(name.clone()));
        }
        let parse = |names: &[String]| -> Result<Vec<F>, WitnessError> {
            names
                .iter()
                .map(|name| {
                    let value = object
                        .get(name)
                        .ok_or_else(|| WitnessError::MissingValue(name.clone()))?;
                    parse_value::<F>(name, value)
                })
                .collect()
        };
        let public = parse(&schema.public)?;
        let has_secret = schema.secret.iter().any(|n| object.contains_key(n));
        let secret = if has_secret { parse(&schema.secret)? } else { Vec::new() };
        Ok(Self { public, secret })
    }

    pub fn from_json_str(schema: &Schema, json: &str) -> Result<Self, WitnessError> {
        Self::from_json(schema, &serde_json::from_str(json)?)
    }
}

fn parse_value<F: PrimeField>(name: &str, value: &Value) -> Result<F, WitnessError> {
    let invalid = || WitnessError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    };
    let integer = match value {
        Value::String(s) => s.parse::<BigInt>().map_err(|_| invalid())?,
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => BigInt::from(u),
            (None, Some(i)) => BigInt::from(i),
            _ => return Err(invalid()),
        },
        _ => return Err(invalid()),
    };
    // canonical form only: negative values and values ≥ p are rejected
    let in_range = integer
        .to_biguint()
        .is_some_and(|u: BigUint| u < modulus::<F>());
    if !in_range {
        return Err(invalid());
    }
    Ok(bigint_to_field(&integer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn schema() -> Schema {
        Schema {
            public: vec!["x".into(), "y".into()],
            secret: vec!["k".into()],
        }
    }

    fn witness() -> Witness<Fr> {
        let mut rng = StdRng::seed_from_u64(7);
        Witness::new(vec![Fr::rand(&mut rng), Fr::from(3u64)], vec![-Fr::from(1u64)])
    }

    #[test]
    fn binary_round_trip_full_and_public() {
        for w in [witness(), witness().public_only()] {
            let mut bytes = Vec::new();
            let written = w.write_to(&mut bytes).unwrap();
            assert_eq!(written as usize, bytes.len());
            let (back, read) = Witness::<Fr>::read_from(bytes.as_slice()).unwrap();
            assert_eq!(back, w);
            assert_eq!(read, written);
            assert_eq!(back.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn json_round_trip_full_and_public() {
        let schema = schema();
        for w in [witness(), witness().public_only()] {
            let json = w.to_json_string(&schema).unwrap();
            let back = Witness::<Fr>::from_json_str(&schema, &json).unwrap();
            assert_eq!(back, w);
        }
        let public = witness().public_only().to_json(&schema).unwrap();
        assert!(public.get("k").is_none());
    }

    #[test]
    fn from_assignment_reduces_and_validates() {
        let assignment = Assignment::new().with("x", 5).with("y", -2).with("k", 9);
        let w = Witness::<Fr>::from_assignment(&schema(), &assignment).unwrap();
        assert_eq!(w.public(), &[Fr::from(5u64), -Fr::from(2u64)]);
        assert_eq!(w.secret(), &[Fr::from(9u64)]);

        let missing = Assignment::new().with("x", 5).with("y", 1);
        assert!(matches!(
            Witness::<Fr>::from_assignment(&schema(), &missing),
            Err(WitnessError::MissingValue(name)) if name == "k"
        ));
        let extra = assignment.with("z", 1);
        assert!(matches!(
            Witness::<Fr>::from_assignment(&schema(), &extra),
            Err(WitnessError::UnknownInput(name)) if name == "z"
        ));
    }

    #[test]
    fn json_rejects_non_canonical_values() {
        let json = serde_json::json!({ "x": "-1", "y": 2 });
        assert!(matches!(
            Witness::<Fr>::from_json(&schema(), &json),
            Err(WitnessError::InvalidValue { .. })
        ));
        let json = serde_json::json!({ "x": 1, "y": 2 });
        let w = Witness::<Fr>::from_json(&schema(), &json).unwrap();
        assert_eq!(w.public(), &[Fr::from(1u64), Fr::from(2u64)]);
        assert!(w.secret().is_empty());
    }
}
