use crate::types::{Injectable, Instance};

/// Key of a caller supplied parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Name(String),
    Index(usize),
}

/// Parameters supplied by the caller of `construct`, `resolve_with` or `call`
///
/// Entries keep insertion order. Named and positional entries may be mixed,
/// positional entries are matched to parameter names by index where a name is needed.
///
/// ```
/// use strata_di::parameters::Parameters;
///
/// let params = Parameters::new().named("step", 25_i64).positional(5_i64);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    entries: Vec<(ParamKey, Instance)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds positional parameters from already wrapped instances
    pub fn from_positional(values: impl IntoIterator<Item = Instance>) -> Self {
        let mut params = Self::new();
        for value in values {
            params = params.positional_instance(value);
        }
        params
    }

    pub fn named<T: Injectable>(self, name: impl Into<String>, value: T) -> Self {
        self.named_instance(name, Instance::new(value))
    }

    pub fn named_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.insert(ParamKey::Name(name.into()), value);
        self
    }

    /// Appends a value at the next free position
    pub fn positional<T: Injectable>(self, value: T) -> Self {
        self.positional_instance(Instance::new(value))
    }

    pub fn positional_instance(mut self, value: Instance) -> Self {
        let index = self.next_index();
        self.insert(ParamKey::Index(index), value);
        self
    }

    /// Sets a value, replacing an existing entry with the same key in place
    pub fn insert(&mut self, key: ParamKey, value: Instance) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.entries.iter().find_map(|(key, value)| match key {
            ParamKey::Name(existing) if existing == name => Some(value),
            _ => None,
        })
    }

    /// Removes and returns the value supplied for `name`
    pub fn take(&mut self, name: &str) -> Option<Instance> {
        let position = self
            .entries
            .iter()
            .position(|(key, _)| matches!(key, ParamKey::Name(existing) if existing == name))?;
        Some(self.entries.remove(position).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ParamKey, Instance)> {
        self.entries.iter()
    }

    /// Remaining values in insertion order, keys dropped
    pub fn into_values(self) -> Vec<Instance> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    /// Re-keys positional entries by the name of the parameter at their index
    ///
    /// Returns the first index that has no matching name.
    pub fn key_by_name<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, usize> {
        let names: Vec<&str> = names.into_iter().collect();
        let entries = std::mem::take(&mut self.entries);
        for (key, value) in entries {
            let key = match key {
                ParamKey::Index(index) => match names.get(index) {
                    Some(name) => ParamKey::Name(name.to_string()),
                    None => return Err(index),
                },
                named => named,
            };
            self.insert(key, value);
        }
        Ok(self)
    }

    fn next_index(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(key, _)| match key {
                ParamKey::Index(index) => Some(index + 1),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}
