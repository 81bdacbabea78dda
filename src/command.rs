use crate::conversion::FromSqlValue;
use crate::error::SqlFluentError;
use crate::types::{CommandKind, DbType, Direction, SqlValue};

/// One typed parameter of a command.
///
/// Built with [`Param::new`] or one of the direction shortcuts, then handed to
/// [`Parameters::parameter`](crate::Parameters::parameter):
/// ```rust
/// use sql_fluent::prelude::*;
///
/// let color = Param::input("@color", DbType::NVarChar, "black").size(50);
/// let new_id = Param::output("@categoryId", DbType::Int);
/// assert_eq!(color.size, Some(50));
/// assert_eq!(new_id.direction, Direction::Output);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub db_type: DbType,
    pub value: SqlValue,
    pub size: Option<usize>,
    pub direction: Direction,
}

impl Param {
    /// An input parameter with no value yet (binds as `NULL`).
    pub fn new(name: impl Into<String>, db_type: DbType) -> Self {
        Self {
            name: name.into(),
            db_type,
            value: SqlValue::Null,
            size: None,
            direction: Direction::Input,
        }
    }

    pub fn input(name: impl Into<String>, db_type: DbType, value: impl Into<SqlValue>) -> Self {
        Self::new(name, db_type).value(value)
    }

    pub fn output(name: impl Into<String>, db_type: DbType) -> Self {
        Self::new(name, db_type).direction(Direction::Output)
    }

    pub fn input_output(
        name: impl Into<String>,
        db_type: DbType,
        value: impl Into<SqlValue>,
    ) -> Self {
        Self::input(name, db_type, value).direction(Direction::InputOutput)
    }

    pub fn return_value(name: impl Into<String>, db_type: DbType) -> Self {
        Self::new(name, db_type).direction(Direction::ReturnValue)
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<SqlValue>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// The value drivers should send: text and binary values of variable-length types are
    /// cut to `size` when one is declared.
    #[must_use]
    pub fn sized_value(&self) -> SqlValue {
        match (&self.value, self.size) {
            (SqlValue::Text(s), Some(size)) if self.db_type.is_variable_length() => {
                SqlValue::Text(s.chars().take(size).collect())
            }
            (SqlValue::Blob(b), Some(size)) if self.db_type.is_variable_length() => {
                SqlValue::Blob(b.iter().copied().take(size).collect())
            }
            (value, _) => value.clone(),
        }
    }

    /// Name without a leading `@`, `:` or `$` sigil.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches(['@', ':', '$'])
    }
}

/// Command text, kind and ordered parameters of one execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandDescriptor {
    pub text: String,
    pub kind: CommandKind,
    pub parameters: Vec<Param>,
}

impl CommandDescriptor {
    pub(crate) fn set_text(&mut self, text: String, kind: CommandKind) {
        self.text = text;
        self.kind = kind;
    }

    pub(crate) fn bind(&mut self, param: Param) {
        self.parameters.push(param);
    }
}

/// Parameter values as reported after execution.
///
/// Handed to the post-execution callback; `Output`, `InputOutput` and `ReturnValue`
/// parameters carry whatever the driver reported, untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Param>,
}

impl ParameterSet {
    pub(crate) fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// Look a parameter up by name; the sigil is optional (`"@id"` and `"id"` both match).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Param> {
        let bare = name.trim_start_matches(['@', ':', '$']);
        self.params
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.params.iter().find(|p| p.bare_name() == bare))
    }

    /// Read a parameter value with the row reader's null-coalescing rules.
    ///
    /// # Errors
    /// Returns [`SqlFluentError::ColumnNotFound`] for an unknown parameter name and
    /// [`SqlFluentError::TypeMismatch`] when the value cannot be read as `T`.
    pub fn value<T: FromSqlValue>(&self, name: &str) -> Result<T, SqlFluentError> {
        let param = self
            .get(name)
            .ok_or_else(|| SqlFluentError::ColumnNotFound(name.to_owned()))?;
        if param.value.is_null() {
            return Ok(T::null_value());
        }
        T::from_sql_value(&param.value).ok_or_else(|| SqlFluentError::TypeMismatch {
            column: param.name.clone(),
            expected: T::TYPE_NAME,
            found: param.value.kind(),
        })
    }

    /// Replace the value of every read-back parameter named in `reported`.
    pub(crate) fn apply_reported(&mut self, reported: Vec<(String, SqlValue)>) {
        for (name, value) in reported {
            let bare = name.trim_start_matches(['@', ':', '$']).to_owned();
            if let Some(param) = self
                .params
                .iter_mut()
                .find(|p| p.direction.reads_back() && p.bare_name() == bare)
            {
                param.value = value;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
