//! Named-parameter rendering
//!
//! The driver binds positionally (`@P1`, `@P2`, ...). Named parameters go
//! through a nested `sp_executesql` call: the statement text and its
//! declaration list are bound as the first two values, then every named
//! argument in order.

use erpgw_core::SqlValue;

/// SQL text plus positional values ready for the driver
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Declared T-SQL type for a bound value
pub fn declared_type(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Bool(_) => "bit",
        SqlValue::Int(_) => "bigint",
        SqlValue::Float(_) => "float",
        SqlValue::Null | SqlValue::Text(_) => "nvarchar(max)",
    }
}

pub fn render(text: &str, params: &[(String, SqlValue)]) -> Rendered {
    if params.is_empty() {
        return Rendered {
            sql: text.to_string(),
            values: Vec::new(),
        };
    }

    let declarations = params
        .iter()
        .map(|(name, value)| format!("@{} {}", name, declared_type(value)))
        .collect::<Vec<_>>()
        .join(", ");

    let assignments = params
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("@{} = @P{}", name, i + 3))
        .collect::<Vec<_>>()
        .join(", ");

    let mut values = Vec::with_capacity(params.len() + 2);
    values.push(SqlValue::Text(text.to_string()));
    values.push(SqlValue::Text(declarations));
    values.extend(params.iter().map(|(_, v)| v.clone()));

    Rendered {
        sql: format!("EXEC sp_executesql @P1, @P2, {}", assignments),
        values,
    }
}
