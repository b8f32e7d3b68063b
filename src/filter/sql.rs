use super::types::{Predicate, Scalar, SqlParam, SqlResult, Window};

/// Renders a `Predicate` into a parameterized WHERE clause. Caller input is
/// only ever bound as a parameter, never spliced into the statement.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(predicate: &Predicate, starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        let clause = filter_where.build(predicate);
        (clause, filter_where.param_values)
    }

    fn build(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::All => "1=1".to_string(),
            Predicate::Eq(field, Scalar::Bool(b)) => {
                format!("{} = {}", field.sql_expr(), self.param(SqlParam::Bool(*b)))
            }
            Predicate::Eq(field, Scalar::Text(s)) => {
                format!("{} = {}", field.sql_expr(), self.param(SqlParam::Text(s.clone())))
            }
            Predicate::Contains(field, needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                format!(
                    "COALESCE({}, '') ILIKE {} ESCAPE '\\'",
                    field.sql_expr(),
                    self.param(SqlParam::Text(pattern))
                )
            }
            Predicate::And(parts) => self.join(parts, " AND ", "1=1"),
            Predicate::Or(parts) => self.join(parts, " OR ", "1=0"),
        }
    }

    fn join(&mut self, parts: &[Predicate], joiner: &str, empty: &str) -> String {
        if parts.is_empty() {
            return empty.to_string();
        }
        let sql_parts: Vec<String> = parts.iter().map(|p| format!("({})", self.build(p))).collect();
        sql_parts.join(joiner)
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so the needle matches literally
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// SELECT for a filtered, optionally windowed read of `table`
pub fn select_sql(table: &str, predicate: &Predicate, window: Option<Window>) -> SqlResult {
    let (where_clause, mut params) = FilterWhere::generate(predicate, 0);
    let mut query = format!(
        "SELECT * FROM \"{}\" WHERE {} ORDER BY \"created_at\" ASC, \"id\" ASC",
        table, where_clause
    );
    if let Some(w) = window {
        let next = params.len();
        query.push_str(&format!(" LIMIT ${} OFFSET ${}", next + 1, next + 2));
        params.push(SqlParam::Int(to_i64(w.limit)));
        params.push(SqlParam::Int(to_i64(w.skip)));
    }
    SqlResult { query, params }
}

pub fn count_sql(table: &str, predicate: &Predicate) -> SqlResult {
    let (where_clause, params) = FilterWhere::generate(predicate, 0);
    SqlResult {
        query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", table, where_clause),
        params,
    }
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
