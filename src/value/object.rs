use indexmap::{
    IndexMap,
    map::{IntoIter, Iter, IterMut},
};

use super::Value;

/// An insertion-ordered object value.
///
/// Response maps iterate in the order their fields were resolved, which
/// matches the flattened selection set's source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    key_value_list: IndexMap<String, Value>,
}

impl Object {
    /// Creates a new [`Object`] with the given number of preallocated slots
    /// for field-value pairs.
    pub fn with_capacity(size: usize) -> Self {
        Self {
            key_value_list: IndexMap::with_capacity(size),
        }
    }

    /// Adds a new field with a value.
    ///
    /// If there is already a field with the given key and both values are
    /// objects, they are merged. Otherwise the existing value is replaced and
    /// returned.
    pub fn add_field<K: Into<String>>(&mut self, k: K, value: Value) -> Option<Value> {
        let key = k.into();
        match (value, self.key_value_list.get_mut(&key)) {
            (Value::Object(obj), Some(Value::Object(existing))) => {
                for (k, v) in obj {
                    existing.add_field(k, v);
                }
                None
            }
            (value, _) => self.key_value_list.insert(key, value),
        }
    }

    /// Checks if the object already contains a field with the given name.
    pub fn contains_field(&self, key: &str) -> bool {
        self.key_value_list.contains_key(key)
    }

    /// Removes the field with the given name, preserving the order of the
    /// remaining fields.
    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.key_value_list.shift_remove(key)
    }

    /// Gets an iterator over all field-value pairs.
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.key_value_list.iter()
    }

    /// Gets an iterator over all mutable field-value pairs.
    pub fn iter_mut(&mut self) -> IterMut<'_, String, Value> {
        self.key_value_list.iter_mut()
    }

    /// The current number of fields.
    pub fn field_count(&self) -> usize {
        self.key_value_list.len()
    }

    /// Gets the value of the given field.
    pub fn get_field_value(&self, key: &str) -> Option<&Value> {
        self.key_value_list.get(key)
    }

    /// Gets a mutable view of the value of the given field.
    pub fn get_mut_field_value(&mut self, key: &str) -> Option<&mut Value> {
        self.key_value_list.get_mut(key)
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.key_value_list.into_iter()
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut ret = Self {
            key_value_list: IndexMap::with_capacity(iter.size_hint().0),
        };
        for (k, v) in iter {
            ret.add_field(k, v);
        }
        ret
    }
}
