//! SQLite SQL dialect.
//!
//! SQLite quirks handled here:
//! - ANSI identifier quoting (`"`)
//! - No native boolean type (1/0)
//! - No RIGHT or FULL OUTER JOIN before 3.39; bundled deployments are
//!   often older, so both are reported unsupported
//! - Dates are text; buckets are built with STRFTIME

use super::helpers;
use super::{DateGrain, SqlDialect};
use crate::sql::token::{Token, TokenStream};

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn supports_right_join(&self) -> bool {
        false
    }

    fn date_bucket(&self, grain: DateGrain, col: &TokenStream) -> TokenStream {
        let mut ts = TokenStream::new();

        match grain {
            DateGrain::Month => {
                strftime(&mut ts, "%Y-%m-01", col);
            }
            DateGrain::Year => {
                strftime(&mut ts, "%Y-01-01", col);
            }
            DateGrain::Quarter => {
                // STRFTIME('%Y', col) || '-Q' || ((STRFTIME('%m', col) + 2) / 3)
                // Arithmetic coerces the month text to a number; integer
                // division yields the quarter ordinal.
                strftime(&mut ts, "%Y", col);
                ts.space()
                    .push(Token::Concat)
                    .space()
                    .push(Token::LitString("-Q".into()))
                    .space()
                    .push(Token::Concat)
                    .space()
                    .lparen()
                    .lparen();
                strftime(&mut ts, "%m", col);
                ts.space()
                    .push(Token::Plus)
                    .space()
                    .push(Token::LitInt(2))
                    .rparen()
                    .space()
                    .push(Token::Div)
                    .space()
                    .push(Token::LitInt(3))
                    .rparen();
            }
        }

        ts
    }
}

fn strftime(ts: &mut TokenStream, format: &str, col: &TokenStream) {
    ts.push(Token::FunctionName("STRFTIME".into()))
        .lparen()
        .push(Token::LitString(format.into()))
        .comma()
        .space()
        .append(col)
        .rparen();
}
