//! MySQL SQL dialect.
//!
//! MySQL quirks handled here:
//! - Backtick identifier quoting
//! - `||` is logical OR by default; CONCAT() must be used instead
//! - No FULL OUTER JOIN
//! - No DATE_TRUNC; buckets are built with DATE_FORMAT / QUARTER()

use super::helpers;
use super::{DateGrain, SqlDialect};
use crate::sql::token::{Token, TokenStream};

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_concat_operator(&self) -> bool {
        false
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn date_bucket(&self, grain: DateGrain, col: &TokenStream) -> TokenStream {
        let mut ts = TokenStream::new();

        match grain {
            DateGrain::Month => {
                ts.push(Token::FunctionName("DATE_FORMAT".into()))
                    .lparen()
                    .append(col)
                    .comma()
                    .space()
                    .push(Token::LitString("%Y-%m-01".into()))
                    .rparen();
            }
            DateGrain::Year => {
                ts.push(Token::FunctionName("DATE_FORMAT".into()))
                    .lparen()
                    .append(col)
                    .comma()
                    .space()
                    .push(Token::LitString("%Y-01-01".into()))
                    .rparen();
            }
            DateGrain::Quarter => {
                // CONCAT(YEAR(col), '-Q', QUARTER(col))
                ts.push(Token::FunctionName("CONCAT".into()))
                    .lparen()
                    .push(Token::FunctionName("YEAR".into()))
                    .lparen()
                    .append(col)
                    .rparen()
                    .comma()
                    .space()
                    .push(Token::LitString("-Q".into()))
                    .comma()
                    .space()
                    .push(Token::FunctionName("QUARTER".into()))
                    .lparen()
                    .append(col)
                    .rparen()
                    .rparen();
            }
        }

        ts
    }
}
