use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed-size, read-only record handed to a sink for the duration of one
/// `process` call.
///
/// Values are opaque to the sink; it only needs to render them as text.
pub trait Tuple {
    /// Number of values in this tuple. Never changes after construction.
    fn size(&self) -> usize;

    /// The value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    fn value(&self, index: usize) -> &dyn fmt::Display;
}

impl<T: fmt::Display> Tuple for [T] {
    fn size(&self) -> usize {
        self.len()
    }

    fn value(&self, index: usize) -> &dyn fmt::Display {
        &self[index]
    }
}

impl<T: fmt::Display> Tuple for Vec<T> {
    fn size(&self) -> usize {
        self.len()
    }

    fn value(&self, index: usize) -> &dyn fmt::Display {
        &self[index]
    }
}

impl<T: fmt::Display, const N: usize> Tuple for [T; N] {
    fn size(&self) -> usize {
        N
    }

    fn value(&self, index: usize) -> &dyn fmt::Display {
        &self[index]
    }
}

/// A single field of a [`Record`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// An owned tuple whose length is fixed once built.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Record {
    values: Box<[Value]>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Record::new(values)
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Record::new(iter.into_iter().collect())
    }
}

impl Tuple for Record {
    fn size(&self) -> usize {
        self.values.len()
    }

    fn value(&self, index: usize) -> &dyn fmt::Display {
        &self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-42i64).to_string(), "-42");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_record_from_json_array() {
        let record: Record = serde_json::from_str(r#"["a", 1, 2.5, false, null]"#).unwrap();
        assert_eq!(record.size(), 5);
        assert_eq!(record.get(0), Some(&Value::Text("a".to_string())));
        assert_eq!(record.get(1), Some(&Value::Int(1)));
        assert_eq!(record.get(2), Some(&Value::Float(2.5)));
        assert_eq!(record.get(3), Some(&Value::Bool(false)));
        assert_eq!(record.get(4), Some(&Value::Null));
        assert_eq!(record.get(5), None);
    }

    #[test]
    fn test_collections_are_tuples() {
        let v = vec!["x", "y"];
        assert_eq!(v.size(), 2);
        assert_eq!(v.value(1).to_string(), "y");

        let arr = [1, 2, 3];
        assert_eq!(Tuple::size(&arr), 3);
        assert_eq!(arr.value(0).to_string(), "1");

        let slice: &[u8] = &[];
        assert_eq!(slice.size(), 0);
    }

    #[test]
    #[should_panic]
    fn test_value_out_of_range_panics() {
        let record = Record::new(vec![Value::Null]);
        record.value(1);
    }
}
