//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used here:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - DATE_TRUNC for date bucketing

use super::helpers;
use super::{DateGrain, SqlDialect};
use crate::sql::token::{Token, TokenStream};

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn date_bucket(&self, grain: DateGrain, col: &TokenStream) -> TokenStream {
        let unit = match grain {
            DateGrain::Month => "month",
            DateGrain::Quarter => "quarter",
            DateGrain::Year => "year",
        };

        let mut ts = TokenStream::new();
        ts.push(Token::FunctionName("DATE_TRUNC".into()))
            .lparen()
            .push(Token::LitString(unit.into()))
            .comma()
            .space()
            .append(col)
            .rparen();
        ts
    }
}
