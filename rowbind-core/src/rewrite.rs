use crate::{Query, Value};

pub const PLACEHOLDER: &str = "?";

/// Expands list arguments into parenthesized placeholder groups.
///
/// `"uid in ? and state = ?"` with `[[1, 2, 3], 1]` becomes
/// `"uid in (?,?,?) and state = ?"` with `[1, 2, 3, 1]`.
///
/// An empty (or NULL) list becomes `(NULL)` and contributes no argument. Mind that
/// `NOT IN (NULL)` matches no row. Non list arguments, blobs included, are kept as
/// they are. Without any list argument the input is returned untouched and the
/// placeholder count is never validated here.
pub fn rewrite_query(query: &str, args: Vec<Value>) -> Query {
    if !args.iter().any(Value::is_list) {
        return Query::new(query, args);
    }
    let mut sql = String::with_capacity(query.len() + args.len() * 4);
    let mut expanded = Vec::with_capacity(args.len());
    let mut args = args.into_iter();
    let mut parts = query.split(PLACEHOLDER).peekable();
    while let Some(part) = parts.next() {
        sql.push_str(part);
        if parts.peek().is_none() {
            break;
        }
        match args.next() {
            Some(Value::List(Some(items), ..)) if !items.is_empty() => {
                sql.push('(');
                for i in 0..items.len() {
                    if i > 0 {
                        sql.push(',');
                    }
                    sql.push_str(PLACEHOLDER);
                }
                sql.push(')');
                expanded.extend(items);
            }
            Some(Value::List(..)) => sql.push_str("(NULL)"),
            Some(arg) => {
                sql.push_str(PLACEHOLDER);
                expanded.push(arg);
            }
            None => sql.push_str(PLACEHOLDER),
        }
    }
    expanded.extend(args);
    Query::new(sql, expanded)
}
