use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Named circuit inputs in declaration order, split by visibility.
#[derive(Clone, Debug, Default, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Schema {
    pub public: Vec<String>,
    pub secret: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Secret,
}

impl Schema {
    pub fn nb_public(&self) -> usize {
        self.public.len()
    }

    pub fn nb_secret(&self) -> usize {
        self.secret.len()
    }

    pub fn visibility(&self, name: &str) -> Option<Visibility> {
        if self.public.iter().any(|n| n == name) {
            Some(Visibility::Public)
        } else if self.secret.iter().any(|n| n == name) {
            Some(Visibility::Secret)
        } else {
            None
        }
    }

    /// All input names, public first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.public.iter().chain(&self.secret).map(String::as_str)
    }
}
