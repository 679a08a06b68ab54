use std::fmt::Display;

/// PostgREST query-string builder.
#[derive(Debug, Default, Clone)]
pub struct Query {
    params: Vec<(String, String)>,
    order: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl Display) -> Self {
        self.params
            .push((column.to_string(), format!("{}.{}", op, value)));
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "neq", value)
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gt", value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, "is", "null")
    }

    pub fn not_null(self, column: &str) -> Self {
        self.filter(column, "not.is", "null")
    }

    /// Case-insensitive substring match.
    pub fn ilike(self, column: &str, needle: &str) -> Self {
        self.filter(column, "ilike", format!("*{}*", needle))
    }

    pub fn is_in<T: Display>(self, column: &str, values: &[T]) -> Self {
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", format!("({})", joined))
    }

    /// Case-insensitive substring search over several columns, OR-ed together.
    pub fn search(self, columns: &[&str], needle: &str) -> Self {
        self.or_ilike("or".to_string(), columns, needle)
    }

    /// Same as `search`, over the columns of an embedded resource
    /// (the embedding must be `!inner` for the filter to restrict parent rows).
    pub fn search_in(self, resource: &str, columns: &[&str], needle: &str) -> Self {
        self.or_ilike(format!("{}.or", resource), columns, needle)
    }

    fn or_ilike(mut self, key: String, columns: &[&str], needle: &str) -> Self {
        if columns.is_empty() || needle.trim().is_empty() {
            return self;
        }
        let pattern = quote_value(&format!("*{}*", needle.trim()));
        let clauses = columns
            .iter()
            .map(|c| format!("{}.ilike.{}", c, pattern))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((key, format!("({})", clauses)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    /// Applies a comma-separated ordering parameter (`-field` for descending).
    /// Fields outside `allowed` are ignored; `default` applies when nothing valid remains.
    pub fn order_by_param(mut self, raw: Option<&str>, allowed: &[&str], default: &str) -> Self {
        let mut applied = false;
        if let Some(raw) = raw {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                let (field, ascending) = match part.strip_prefix('-') {
                    Some(field) => (field, false),
                    None => (part, true),
                };
                if allowed.contains(&field) {
                    self = self.order(field, ascending);
                    applied = true;
                }
            }
        }
        if !applied {
            let (field, ascending) = match default.strip_prefix('-') {
                Some(field) => (field, false),
                None => (default, true),
            };
            self = self.order(field, ascending);
        }
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.params.push(("offset".to_string(), offset.to_string()));
        self
    }

    pub fn paginate(self, limit: Option<i64>, offset: Option<i64>) -> Self {
        let query = match limit {
            Some(limit) if limit > 0 => self.limit(limit.min(500)),
            _ => self,
        };
        match offset {
            Some(offset) if offset > 0 => query.offset(offset),
            _ => query,
        }
    }

    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        if !self.order.is_empty() {
            parts.push(format!("order={}", self.order.join(",")));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}

/// Double-quotes a value inside a logic-tree list so commas, dots and
/// parentheses in user input are not read as syntax.
fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_has_no_query_string() {
        assert_eq!(Query::new().to_query_string(), "");
    }

    #[test]
    fn builds_filters_in_order() {
        let qs = Query::new().eq("id", 5).eq("activo", true).to_query_string();
        assert_eq!(qs, "?id=eq.5&activo=eq.true");
    }

    #[test]
    fn null_checks() {
        let qs = Query::new().is_null("resultados").not_null("diagnostico").to_query_string();
        assert_eq!(qs, "?resultados=is.null&diagnostico=not.is.null");
    }

    #[test]
    fn encodes_search_clause() {
        let qs = Query::new().search(&["email", "nombre"], "ana").to_query_string();
        assert_eq!(
            qs,
            format!("?or={}", urlencoding::encode(r#"(email.ilike."*ana*",nombre.ilike."*ana*")"#))
        );
    }

    #[test]
    fn search_text_with_separators_stays_one_value() {
        let qs = Query::new().search(&["apellido"], " García, Ana (hijo) ").to_query_string();
        assert_eq!(
            qs,
            format!("?or={}", urlencoding::encode(r#"(apellido.ilike."*García, Ana (hijo)*")"#))
        );
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(quote_value(r#"*O"Neil\x*"#), r#""*O\"Neil\\x*""#);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(Query::new().search(&["email"], "  ").to_query_string(), "");
    }

    #[test]
    fn ordering_param_filters_unknown_fields() {
        let qs = Query::new()
            .order_by_param(Some("-email,password,nombre"), &["id", "email", "nombre"], "id")
            .to_query_string();
        assert_eq!(qs, "?order=email.desc,nombre.asc");
    }

    #[test]
    fn ordering_falls_back_to_default() {
        let qs = Query::new()
            .order_by_param(Some("password"), &["id"], "-id")
            .to_query_string();
        assert_eq!(qs, "?order=id.desc");
    }

    #[test]
    fn in_filter_and_pagination() {
        let qs = Query::new()
            .is_in("id", &[1, 2, 3])
            .paginate(Some(10), Some(20))
            .to_query_string();
        assert_eq!(qs, format!("?id={}&limit=10&offset=20", urlencoding::encode("in.(1,2,3)")));
    }
}
