//! Compiles a [`ChangeSet`] into a parameterized `UPDATE` statement.

use crate::domain::diff::ChangeSet;
use crate::domain::record::{FieldValue, Schema};

/// An `UPDATE` statement and its bound parameters, id last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUpdate {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

/// Builds the statement writing `changes` to the row identified by `id`.
///
/// Returns `None` for an empty change set. One column compiles to
/// `SET col = $1`; several compile to the tuple form `SET (a, b) = ($1, $2)`,
/// which PostgreSQL rejects for a single column.
pub fn compile_update(schema: &Schema, id: i64, changes: &ChangeSet) -> Option<CompiledUpdate> {
    if changes.is_empty() {
        return None;
    }

    let mut columns = Vec::with_capacity(changes.len());
    let mut values = Vec::with_capacity(changes.len());
    let mut params = Vec::with_capacity(changes.len() + 1);

    for (column, value) in changes.iter() {
        let placeholder = format!("${}", params.len() + 1);
        columns.push(column);
        values.push(schema.write_expr(column, &placeholder));
        params.push(value.clone());
    }

    let assignment = if columns.len() == 1 {
        format!("{} = {}", columns[0], values[0])
    } else {
        format!("({}) = ({})", columns.join(", "), values.join(", "))
    };

    params.push(FieldValue::Int(id));
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        schema.table,
        assignment,
        schema.id_column,
        params.len()
    );

    Some(CompiledUpdate { sql, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Link, User};
    use crate::domain::record::Record;

    fn link() -> Link {
        Link {
            id: 1,
            long_link: "http://a".to_string(),
            click_counter: 5,
            owner_id: Some(1),
            is_active: true,
        }
    }

    #[test]
    fn test_empty_change_set_compiles_to_nothing() {
        let changes = ChangeSet::of(&link(), &link());

        assert_eq!(compile_update(Link::SCHEMA, 1, &changes), None);
    }

    #[test]
    fn test_single_column_form() {
        let mut proposed = link();
        proposed.long_link = "http://b".to_string();
        let changes = ChangeSet::of(&link(), &proposed);

        let compiled = compile_update(Link::SCHEMA, 1, &changes).unwrap();

        assert_eq!(compiled.sql, "UPDATE links SET long_link = $1 WHERE id = $2");
        assert_eq!(
            compiled.params,
            vec![FieldValue::from("http://b"), FieldValue::Int(1)]
        );
    }

    #[test]
    fn test_tuple_form_for_several_columns() {
        let mut proposed = link();
        proposed.click_counter = 6;
        proposed.is_active = false;
        let changes = ChangeSet::of(&link(), &proposed);

        let compiled = compile_update(Link::SCHEMA, 1, &changes).unwrap();

        assert_eq!(
            compiled.sql,
            "UPDATE links SET (click_counter, is_active) = ($1, $2) WHERE id = $3"
        );
        assert_eq!(
            compiled.params,
            vec![FieldValue::Int(6), FieldValue::Bool(false), FieldValue::Int(1)]
        );
    }

    #[test]
    fn test_values_are_never_interpolated() {
        let mut proposed = link();
        proposed.long_link = "x'; DROP TABLE links; --".to_string();
        let changes = ChangeSet::of(&link(), &proposed);

        let compiled = compile_update(Link::SCHEMA, 1, &changes).unwrap();

        assert!(!compiled.sql.contains("DROP"));
        assert_eq!(compiled.params[0], FieldValue::from("x'; DROP TABLE links; --"));
    }

    #[test]
    fn test_password_goes_through_crypt() {
        let stored = User {
            id: 3,
            ..User::new("iivanov", "$2a$08$hash")
        };
        let mut proposed = stored.clone();
        proposed.password = "newpass".to_string();
        proposed.email = "ivan@example.loc".to_string();
        let changes = ChangeSet::of(&stored, &proposed);

        let compiled = compile_update(User::SCHEMA, 3, &changes).unwrap();

        assert_eq!(
            compiled.sql,
            "UPDATE users SET (password, email) = (crypt($1, gen_salt('bf', 8)), $2) WHERE id = $3"
        );
        assert_eq!(compiled.params.last(), Some(&FieldValue::Int(3)));
    }
}
