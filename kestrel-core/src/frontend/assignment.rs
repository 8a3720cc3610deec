use std::collections::BTreeMap;

use num_bigint::BigInt;

/// Values for a circuit's named inputs. Values are arbitrary integers and are reduced into the
/// target field when a witness is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<String, BigInt>,
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<BigInt>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<BigInt>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&BigInt> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BigInt)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<BigInt>> FromIterator<(K, V)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut assignment = Self::new();
        for (k, v) in iter {
            assignment.set(k, v);
        }
        assignment
    }
}
