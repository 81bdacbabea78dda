use crate::command::{CommandDescriptor, Param};
use crate::types::{CommandKind, DbType, Direction, SqlValue};

/// First column of the trailing result set that carries output parameter values.
pub(crate) const OUTPUTS_MARKER: &str = "__sql_fluent_outputs";

const RETURN_VARIABLE: &str = "@__sql_fluent_return";

/// A command rewritten as a single T-SQL batch.
///
/// tiberius only knows positional `@P1..@Pn` parameters, so every named parameter becomes
/// a local variable declared at the top of the batch and initialised from its positional
/// slot. Stored procedures run through `EXEC`, and any `Output`, `InputOutput` or
/// `ReturnValue` parameters are selected in a final marker result set that the worker
/// hides from mappers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MssqlBatch {
    pub(crate) text: String,
    pub(crate) values: Vec<(DbType, SqlValue)>,
}

impl MssqlBatch {
    pub(crate) fn build(command: &CommandDescriptor) -> Self {
        let mut text = String::new();
        let mut values = Vec::new();

        for param in &command.parameters {
            if param.direction == Direction::ReturnValue {
                continue;
            }
            let name = variable_name(param);
            let declared = declaration(param);
            if param.direction.sends_value() {
                values.push((param.db_type, param.sized_value()));
                text.push_str(&format!(
                    "DECLARE {name} {declared} = @P{};\n",
                    values.len()
                ));
            } else {
                text.push_str(&format!("DECLARE {name} {declared};\n"));
            }
        }

        let return_param = command
            .parameters
            .iter()
            .find(|p| p.direction == Direction::ReturnValue);

        match command.kind {
            CommandKind::Text => {
                text.push_str(&command.text);
                text.push_str(";\n");
            }
            CommandKind::StoredProcedure => {
                if return_param.is_some() {
                    text.push_str(&format!("DECLARE {RETURN_VARIABLE} INT;\n"));
                    text.push_str(&format!("EXEC {RETURN_VARIABLE} = {}", command.text));
                } else {
                    text.push_str(&format!("EXEC {}", command.text));
                }
                let arguments: Vec<String> = command
                    .parameters
                    .iter()
                    .filter(|p| p.direction != Direction::ReturnValue)
                    .map(|p| {
                        let name = variable_name(p);
                        if p.direction.reads_back() {
                            format!("{name} = {name} OUTPUT")
                        } else {
                            format!("{name} = {name}")
                        }
                    })
                    .collect();
                if !arguments.is_empty() {
                    text.push(' ');
                    text.push_str(&arguments.join(", "));
                }
                text.push_str(";\n");
            }
        }

        let mut outputs: Vec<String> = command
            .parameters
            .iter()
            .filter(|p| matches!(p.direction, Direction::Output | Direction::InputOutput))
            .map(|p| format!("{} AS {}", variable_name(p), quote_identifier(&p.name)))
            .collect();
        if command.kind == CommandKind::StoredProcedure {
            if let Some(ret) = return_param {
                outputs.push(format!("{RETURN_VARIABLE} AS {}", quote_identifier(&ret.name)));
            }
        }
        if !outputs.is_empty() {
            text.push_str(&format!(
                "SELECT 0 AS {}, {};\n",
                quote_identifier(OUTPUTS_MARKER),
                outputs.join(", ")
            ));
        }

        Self { text, values }
    }
}

fn variable_name(param: &Param) -> String {
    format!("@{}", param.bare_name())
}

fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// T-SQL type used to declare a parameter's local variable.
///
/// Fixed-length types without a `size` take their length from the value, and `DECIMAL`
/// takes its scale from `size` or from the value's fractional digits.
fn declaration(param: &Param) -> String {
    let length = |default: &str| param.size.map_or_else(|| default.to_owned(), |s| s.to_string());
    match param.db_type {
        DbType::TinyInt => "TINYINT".into(),
        DbType::SmallInt => "SMALLINT".into(),
        DbType::Int => "INT".into(),
        DbType::BigInt => "BIGINT".into(),
        DbType::Bit => "BIT".into(),
        DbType::Real => "REAL".into(),
        DbType::Float => "FLOAT".into(),
        DbType::Decimal => format!("DECIMAL({MAX_PRECISION}, {})", decimal_scale(param)),
        DbType::Money => "MONEY".into(),
        DbType::Char => fixed_length(param, "CHAR", "VARCHAR", 8000),
        DbType::VarChar => format!("VARCHAR({})", length("MAX")),
        DbType::NChar => fixed_length(param, "NCHAR", "NVARCHAR", 4000),
        DbType::NVarChar => format!("NVARCHAR({})", length("MAX")),
        DbType::Text => "VARCHAR(MAX)".into(),
        DbType::NText => "NVARCHAR(MAX)".into(),
        DbType::Binary => fixed_length(param, "BINARY", "VARBINARY", 8000),
        DbType::VarBinary => format!("VARBINARY({})", length("MAX")),
        DbType::Date => "DATE".into(),
        DbType::Time => "TIME".into(),
        DbType::DateTime => "DATETIME".into(),
        DbType::DateTime2 => "DATETIME2".into(),
        DbType::UniqueIdentifier => "UNIQUEIDENTIFIER".into(),
        DbType::Xml => "XML".into(),
    }
}

const MAX_PRECISION: usize = 38;
const DEFAULT_SCALE: usize = 10;

/// `CHAR(n)`-style declaration. An explicit `size` wins; otherwise `n` is the value's length
/// (at least 1), and values past the type's fixed maximum fall back to the `MAX` form.
fn fixed_length(param: &Param, fixed: &str, variable: &str, max: usize) -> String {
    if let Some(size) = param.size {
        return format!("{fixed}({size})");
    }
    let len = match &param.value {
        SqlValue::Text(s) if param.db_type == DbType::NChar => s.chars().count(),
        SqlValue::Text(s) => s.len(),
        SqlValue::Blob(b) => b.len(),
        SqlValue::Int(i) => i.to_string().len(),
        SqlValue::Float(f) => f.to_string().len(),
        SqlValue::Bool(_) | SqlValue::Null => 1,
        SqlValue::Timestamp(ts) => ts.to_string().len(),
        SqlValue::Date(d) => d.to_string().len(),
        SqlValue::Json(j) => j.to_string().len(),
    };
    if len > max {
        format!("{variable}(MAX)")
    } else {
        format!("{fixed}({})", len.max(1))
    }
}

fn decimal_scale(param: &Param) -> usize {
    if let Some(size) = param.size {
        return size.min(MAX_PRECISION);
    }
    let digits = match &param.value {
        SqlValue::Int(_) => return 0,
        SqlValue::Float(f) if f.is_finite() => f.to_string(),
        SqlValue::Text(s) => s.trim().to_owned(),
        _ => return DEFAULT_SCALE,
    };
    let Some((whole, fraction)) = digits.split_once('.') else {
        return 0;
    };
    let whole_digits = whole.chars().filter(char::is_ascii_digit).count();
    let fraction_digits = fraction.chars().take_while(char::is_ascii_digit).count();
    fraction_digits.min(MAX_PRECISION.saturating_sub(whole_digits))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(kind: CommandKind, text: &str, parameters: Vec<Param>) -> CommandDescriptor {
        CommandDescriptor {
            text: text.into(),
            kind,
            parameters,
        }
    }

    #[test]
    fn ad_hoc_text_declares_named_parameters() {
        let batch = MssqlBatch::build(&command(
            CommandKind::Text,
            "select top 25 * from SalesLT.Product where productid > @productId and Color = @color",
            vec![
                Param::input("@productId", DbType::Int, 800),
                Param::input("@color", DbType::NVarChar, "black").size(50),
            ],
        ));
        assert_eq!(
            batch.text,
            "DECLARE @productId INT = @P1;\n\
             DECLARE @color NVARCHAR(50) = @P2;\n\
             select top 25 * from SalesLT.Product where productid > @productId and Color = @color;\n"
        );
        assert_eq!(
            batch.values,
            vec![
                (DbType::Int, SqlValue::Int(800)),
                (DbType::NVarChar, SqlValue::Text("black".into())),
            ]
        );
    }

    #[test]
    fn stored_procedure_with_outputs_and_return_value() {
        let batch = MssqlBatch::build(&command(
            CommandKind::StoredProcedure,
            "SalesLT.AddCategory",
            vec![
                Param::input("@name", DbType::NVarChar, "Test").size(200),
                Param::output("@categoryId", DbType::Int),
                Param::return_value("@retVal", DbType::Int),
            ],
        ));
        assert_eq!(
            batch.text,
            "DECLARE @name NVARCHAR(200) = @P1;\n\
             DECLARE @categoryId INT;\n\
             DECLARE @__sql_fluent_return INT;\n\
             EXEC @__sql_fluent_return = SalesLT.AddCategory @name = @name, @categoryId = @categoryId OUTPUT;\n\
             SELECT 0 AS [__sql_fluent_outputs], @categoryId AS [@categoryId], @__sql_fluent_return AS [@retVal];\n"
        );
        assert_eq!(batch.values.len(), 1);
    }

    #[test]
    fn unsized_fixed_length_types_take_the_value_length() {
        let batch = MssqlBatch::build(&command(
            CommandKind::Text,
            "select @code, @hash, @blank, @price, @ratio, @rate",
            vec![
                Param::input("@code", DbType::NChar, "ABCDE"),
                Param::input("@hash", DbType::Binary, vec![1_u8, 2, 3]),
                Param::input("@blank", DbType::Char, ""),
                Param::input("@price", DbType::Decimal, 1234.5678),
                Param::input("@ratio", DbType::Decimal, 0.5).size(4),
                Param::output("@rate", DbType::Decimal),
            ],
        ));
        assert_eq!(
            batch.text,
            "DECLARE @code NCHAR(5) = @P1;\n\
             DECLARE @hash BINARY(3) = @P2;\n\
             DECLARE @blank CHAR(1) = @P3;\n\
             DECLARE @price DECIMAL(38, 4) = @P4;\n\
             DECLARE @ratio DECIMAL(38, 4) = @P5;\n\
             DECLARE @rate DECIMAL(38, 10);\n\
             select @code, @hash, @blank, @price, @ratio, @rate;\n\
             SELECT 0 AS [__sql_fluent_outputs], @rate AS [@rate];\n"
        );
        assert_eq!(batch.values[0], (DbType::NChar, SqlValue::Text("ABCDE".into())));
    }

    #[test]
    fn sized_fixed_length_types_keep_the_declared_size() {
        let batch = MssqlBatch::build(&command(
            CommandKind::Text,
            "select @code",
            vec![Param::input("@code", DbType::NChar, "AB").size(10)],
        ));
        assert!(batch.text.starts_with("DECLARE @code NCHAR(10) = @P1;\n"));
    }

    #[test]
    fn no_outputs_means_no_marker_set() {
        let batch = MssqlBatch::build(&command(
            CommandKind::StoredProcedure,
            "dbo.Ping",
            Vec::new(),
        ));
        assert_eq!(batch.text, "EXEC dbo.Ping;\n");
        assert!(batch.values.is_empty());
    }
}
