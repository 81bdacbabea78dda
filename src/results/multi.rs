use std::any::Any;
use std::collections::HashMap;

use crate::error::SqlFluentError;

use super::Row;

/// A registered multi reader with its element type erased.
///
/// The concrete type is fixed when the reader is registered, so nothing is ever cast back
/// from an untyped callback.
pub(crate) trait RowSink: Send {
    fn push(&mut self, row: &Row) -> Result<(), SqlFluentError>;
    fn into_rows(self: Box<Self>) -> Box<dyn Any + Send>;
}

pub(crate) struct TypedSink<T, F> {
    mapper: F,
    rows: Vec<T>,
}

impl<T, F> TypedSink<T, F> {
    pub(crate) fn new(mapper: F) -> Self {
        Self {
            mapper,
            rows: Vec::new(),
        }
    }
}

impl<T, F> RowSink for TypedSink<T, F>
where
    T: Send + 'static,
    F: FnMut(&Row) -> Result<T, SqlFluentError> + Send,
{
    fn push(&mut self, row: &Row) -> Result<(), SqlFluentError> {
        let item = (self.mapper)(row)?;
        self.rows.push(item);
        Ok(())
    }

    fn into_rows(self: Box<Self>) -> Box<dyn Any + Send> {
        Box::new(self.rows)
    }
}

/// Named, independent result sets produced by a multi execution.
///
/// Each key holds the `Vec<T>` built by the reader registered under it. Looking up a key
/// that was never registered, or asking for a different `T` than the reader produced,
/// yields an empty sequence.
#[derive(Default)]
pub struct MultiResults {
    sets: HashMap<String, Box<dyn Any + Send>>,
    order: Vec<String>,
}

impl MultiResults {
    pub(crate) fn insert(&mut self, key: String, rows: Box<dyn Any + Send>) {
        if self.sets.insert(key.clone(), rows).is_none() {
            self.order.push(key);
        }
    }

    /// Borrow the rows stored under `key`.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> &[T] {
        self.sets
            .get(key)
            .and_then(|rows| rows.downcast_ref::<Vec<T>>())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Move the rows stored under `key` out of the results.
    pub fn take<T: 'static>(&mut self, key: &str) -> Vec<T> {
        let Some(rows) = self.sets.remove(key) else {
            return Vec::new();
        };
        match rows.downcast::<Vec<T>>() {
            Ok(rows) => {
                self.order.retain(|k| k != key);
                *rows
            }
            Err(rows) => {
                // wrong type requested, keep the set for a correctly typed lookup
                self.sets.insert(key.to_owned(), rows);
                Vec::new()
            }
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.sets.contains_key(key)
    }

    /// Keys in the order their readers were registered.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for MultiResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiResults")
            .field("keys", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_lookup_and_unknown_keys() {
        let mut results = MultiResults::default();
        results.insert("ids".into(), Box::new(vec![1_i64, 2, 3]));
        results.insert("names".into(), Box::new(vec!["a".to_owned()]));

        assert_eq!(results.get::<i64>("ids"), &[1, 2, 3]);
        assert!(results.get::<i64>("missing").is_empty());
        assert!(results.get::<String>("ids").is_empty());
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["ids", "names"]);

        assert!(results.take::<u8>("names").is_empty());
        assert_eq!(results.take::<String>("names"), vec!["a".to_owned()]);
        assert!(!results.contains_key("names"));
        assert_eq!(results.len(), 1);
    }
}
