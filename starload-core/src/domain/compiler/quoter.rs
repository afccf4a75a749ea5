// starload-core/src/domain/compiler/quoter.rs

/// Quoting helpers for the few places where text is interpolated into SQL.
///
/// Identifiers only ever come from the closed table catalog, literals come from
/// pipeline configuration (bucket, region, IAM role, schema names).
pub struct Quoter;

impl Quoter {
    /// `songplay` -> `"songplay"`, embedded quotes doubled.
    pub fn identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// `it's` -> `'it''s'`
    pub fn literal(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(Quoter::identifier("time"), "\"time\"");
        assert_eq!(Quoter::identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(Quoter::literal("public"), "'public'");
        assert_eq!(Quoter::literal("o'brien"), "'o''brien'");
    }
}
